use std::sync::Arc;

use sqlx::SqlitePool;

use shared::message::{BusMessage, EventType};

use crate::core::Config;
use crate::db::DbService;
use crate::message::{MessageBus, MessageHandler, TransportConfig};
use crate::utils::{AppError, AppResult};

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是服务端的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | SqlitePool | 嵌入式数据库连接池 |
/// | message_bus | Arc<MessageBus> | 消息总线 |
///
/// # 使用示例
///
/// ```ignore
/// // 广播领域事件
/// state.broadcast_event(EventType::OrderPlaced, &order).await;
/// ```
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库连接池 (SQLite)
    pub db: SqlitePool,
    /// 消息总线
    pub message_bus: Arc<MessageBus>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`initialize()`] 方法代替
    pub fn new(config: Config, db: SqlitePool, message_bus: Arc<MessageBus>) -> Self {
        Self {
            config,
            db,
            message_bus,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/kds.db)
    /// 3. 消息总线
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        // 0. Ensure work_dir structure exists
        config.ensure_work_dir_structure().map_err(|e| {
            AppError::internal(format!("Failed to create work directory structure: {e}"))
        })?;

        // 1. Initialize DB
        let db_path = config.database_dir().join("kds.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        // 2. Initialize MessageBus
        let transport_config = TransportConfig {
            tcp_listen_addr: format!("0.0.0.0:{}", config.bus_tcp_port),
            channel_capacity: config.bus_channel_capacity,
        };
        let message_bus = Arc::new(MessageBus::from_config(transport_config));

        Ok(Self::new(config.clone(), db_service.pool, message_bus))
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 消息处理器 (MessageHandler): 响应客户端的快照请求
    pub fn start_background_tasks(&self) {
        let handler = MessageHandler::new(&self.message_bus, self.db.clone());
        tokio::spawn(async move {
            handler.run().await;
        });
    }

    /// 获取消息总线
    pub fn message_bus(&self) -> &Arc<MessageBus> {
        &self.message_bus
    }

    /// 广播领域事件
    ///
    /// 向所有连接的客户端广播资源变更通知。
    /// 发布失败 (无订阅者) 不视为错误。
    ///
    /// # 参数
    /// - `event_type`: 事件类型 (如 OrderPlaced, ItemAdded)
    /// - `data`: 事件载荷 (序列化为 JSON)
    pub async fn broadcast_event<T: serde::Serialize>(&self, event_type: EventType, data: &T) {
        let _ = self
            .message_bus
            .publish(BusMessage::event(event_type, data))
            .await;
    }
}
