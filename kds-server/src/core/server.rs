//! Server Implementation
//!
//! HTTP 服务器启动和管理

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};
use crate::utils::{AppError, AppResult};

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

/// 构建完整的应用路由
///
/// API 路由之外，所有未匹配的路径回落到静态文件目录
/// (厨房显示屏前端构建产物)
pub fn build_app(static_dir: &str) -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::items::router())
        .merge(crate::api::orders::router())
        .fallback_service(ServeDir::new(static_dir))
}

impl Server {
    /// Create server over an initialized state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub async fn run(&self) -> AppResult<()> {
        let state = self.state.clone();

        // Start background tasks (snapshot request handler)
        state.start_background_tasks();

        // Start Message Bus TCP server
        let message_bus = state.message_bus.clone();
        tokio::spawn(async move {
            if let Err(e) = message_bus.start_tcp_server().await {
                tracing::error!("Message Bus TCP server failed: {}", e);
            }
        });

        let app = build_app(&self.config.static_dir)
            .with_state(state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("KDS server starting on http://{}", addr);
        tracing::info!(
            "Message bus listening on tcp://0.0.0.0:{}",
            self.config.bus_tcp_port
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;

        // Stop the message bus after HTTP server exits
        state.message_bus.shutdown();

        Ok(())
    }
}
