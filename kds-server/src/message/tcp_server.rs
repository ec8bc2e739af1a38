//! TCP 服务器实现
//!
//! 负责处理 TCP 客户端连接，包括：
//! - 监听连接
//! - 协议握手验证
//! - 消息转发 (广播 + 单播过滤)

use std::net::SocketAddr;
use std::sync::Arc;

use shared::message::{
    BusMessage, EventType, HandshakePayload, PROTOCOL_VERSION, ResponsePayload, ResyncPayload,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::bus::MessageBus;
use super::transport::{TcpTransport, Transport};
use crate::utils::AppError;

impl MessageBus {
    /// Start TCP server (for network clients)
    ///
    /// This is a TCP server that:
    /// 1. Accepts connections
    /// 2. Reads messages from clients and publishes to client_tx (server receives)
    /// 3. Forwards server broadcast messages to connected clients
    /// 4. Gracefully shuts down on cancellation signal
    pub async fn start_tcp_server(&self) -> Result<(), AppError> {
        let listener = TcpListener::bind(&self.config.tcp_listen_addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind: {e}")))?;

        tracing::info!(
            "Message bus TCP server listening on {}",
            self.config.tcp_listen_addr
        );

        self.accept_loop(listener).await
    }

    /// Main accept loop
    async fn accept_loop(&self, listener: TcpListener) -> Result<(), AppError> {
        loop {
            tokio::select! {
                _ = self.shutdown_token().cancelled() => {
                    tracing::info!("Message bus TCP server shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::debug!("Client connected: {}", addr);
                            self.spawn_client_handler(stream, addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Spawn a new task to handle client connection
    fn spawn_client_handler(&self, stream: TcpStream, addr: SocketAddr) {
        let server_tx = self.sender().clone();
        let client_tx = self.sender_to_server().clone();
        let shutdown_token = self.shutdown_token().clone();

        tokio::spawn(async move {
            if let Err(e) =
                handle_client_connection(stream, addr, server_tx, client_tx, shutdown_token).await
            {
                tracing::debug!("Client {} handler finished: {}", addr, e);
            }
        });
    }
}

/// Handle a single client connection
async fn handle_client_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: broadcast::Sender<BusMessage>,
    client_tx: broadcast::Sender<BusMessage>,
    shutdown_token: CancellationToken,
) -> Result<(), AppError> {
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::from_stream(stream));

    // Protocol handshake
    let client_id = perform_handshake(&transport, addr).await?;
    tracing::debug!("Client connected: {}", client_id);

    // 创建共享的断开检测 token
    let disconnect_token = CancellationToken::new();
    let disconnect_token_clone = disconnect_token.clone();

    // Start message forwarding (当客户端断开时，forwarder 也要停止)
    let forward_handle = spawn_server_to_client_forwarder(
        transport.clone(),
        server_tx.subscribe(),
        shutdown_token.clone(),
        client_id.clone(),
        disconnect_token_clone,
    );

    // Read messages from client - 当检测到断开时，取消 disconnect_token
    read_client_messages(
        &transport,
        &client_tx,
        &shutdown_token,
        &client_id,
        addr,
        disconnect_token,
    )
    .await;

    // Cleanup
    drop(forward_handle);
    let _ = transport.close().await;
    tracing::debug!(client_id = %client_id, "Client connection closed");

    Ok(())
}

/// Perform protocol handshake with client
async fn perform_handshake(
    transport: &Arc<dyn Transport>,
    addr: SocketAddr,
) -> Result<String, AppError> {
    tracing::debug!("Waiting for handshake from {}", addr);

    let msg = transport.read_message().await.map_err(|e| {
        tracing::warn!("Client {} handshake error: {}", addr, e);
        e
    })?;

    if msg.event_type != EventType::Handshake {
        tracing::warn!(
            "Client {} failed to handshake: expected Handshake, got {}",
            addr,
            msg.event_type
        );
        return Err(AppError::validation("Expected Handshake message"));
    }

    let payload: HandshakePayload = msg.parse_payload().map_err(|e| {
        tracing::warn!("Client {} sent invalid handshake payload: {}", addr, e);
        AppError::validation(format!("Invalid handshake payload: {e}"))
    })?;

    // Version check
    if payload.version != PROTOCOL_VERSION {
        tracing::warn!(
            "Client {} protocol version mismatch: expected {}, got {}",
            addr,
            PROTOCOL_VERSION,
            payload.version
        );

        send_handshake_error(
            transport,
            &msg,
            &format!(
                "Protocol version mismatch: server={}, client={}. Please update your client.",
                PROTOCOL_VERSION, payload.version
            ),
        )
        .await;

        return Err(AppError::validation("Protocol version mismatch"));
    }

    let client_id = payload
        .client_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::debug!(
        "Client {} handshake success (v{}, client: {:?}, id: {})",
        addr,
        payload.version,
        payload.client_name,
        client_id
    );

    // 发送 RPC 响应 (用 correlation_id 关联客户端的 request_id)
    let response_payload =
        ResponsePayload::success(format!("Connected as client: {client_id}"), None);
    let response = BusMessage::response(&response_payload).with_correlation_id(msg.request_id);
    if let Err(e) = transport.write_message(&response).await {
        tracing::warn!("Failed to send handshake response: {}", e);
    }

    Ok(client_id)
}

/// Delay before closing connection after sending error (allows client to receive the message)
const HANDSHAKE_ERROR_DELAY_MS: u64 = 100;

/// Send handshake error to client
async fn send_handshake_error(transport: &Arc<dyn Transport>, msg: &BusMessage, message: &str) {
    let response_payload = ResponsePayload::error(message);
    let response = BusMessage::response(&response_payload).with_correlation_id(msg.request_id);

    if let Err(e) = transport.write_message(&response).await {
        tracing::error!("Failed to send handshake error: {}", e);
    }

    // Give client some time to receive the message before closing
    tokio::time::sleep(tokio::time::Duration::from_millis(HANDSHAKE_ERROR_DELAY_MS)).await;
}

/// Spawn task to forward messages from server to client
fn spawn_server_to_client_forwarder(
    transport: Arc<dyn Transport>,
    mut rx: broadcast::Receiver<BusMessage>,
    shutdown_token: CancellationToken,
    client_id: String,
    disconnect_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    tracing::debug!("Client {} forwarder shutting down", client_id);
                    break;
                }
                _ = disconnect_token.cancelled() => {
                    tracing::debug!(client_id = %client_id, "Client disconnected, forwarder stopping");
                    break;
                }
                msg_result = rx.recv() => {
                    match msg_result {
                        Ok(msg) => {
                            // Unicast filtering: only send if target matches or no target
                            if msg.target.as_ref().is_some_and(|target| target != &client_id) {
                                continue;
                            }

                            if let Err(e) = transport.write_message(&msg).await {
                                tracing::debug!(client_id = %client_id, "Client write failed: {}", e);
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            // 客户端掉队：通知其发起 refresh 全量重同步，不断开连接
                            tracing::warn!(
                                client_id = %client_id,
                                dropped_messages = n,
                                "Client lagged behind, sending resync notification"
                            );

                            let resync_msg = BusMessage::resync(&ResyncPayload {
                                reason: "lagged".to_string(),
                                dropped_messages: n,
                            })
                            .with_target(&client_id);

                            if let Err(e) = transport.write_message(&resync_msg).await {
                                tracing::debug!(client_id = %client_id, "Failed to send resync notification: {}", e);
                                break;
                            }

                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!(client_id = %client_id, "Broadcast channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!(client_id = %client_id, "Client forwarder stopped");
    })
}

/// Read messages from client and forward to server
async fn read_client_messages(
    transport: &Arc<dyn Transport>,
    client_tx: &broadcast::Sender<BusMessage>,
    shutdown_token: &CancellationToken,
    client_id: &str,
    addr: SocketAddr,
    disconnect_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                break;
            }

            read_result = transport.read_message() => {
                match read_result {
                    Ok(mut msg) => {
                        // Inject client ID (source tracking, used to address snapshot replies)
                        msg.source = Some(client_id.to_string());

                        // Publish to client_tx so server handlers receive it
                        if let Err(e) = client_tx.send(msg) {
                            tracing::warn!("Failed to publish client message: {}", e);
                        }
                    }
                    Err(e) => {
                        if matches!(e, AppError::ClientDisconnected) {
                            tracing::debug!(client_id = %client_id, "Client {} disconnected", addr);
                        } else {
                            tracing::debug!(client_id = %client_id, "Client {} read error: {}", addr, e);
                        }
                        // 通知 forwarder 客户端已断开
                        disconnect_token.cancel();
                        break;
                    }
                }
            }
        }
    }
}
