//! 消息总线核心实现
//!
//! # 消息流
//!
//! ```text
//! Client ──▶ write_message() ──▶ client_tx ──▶ MessageHandler
//!                                          │
//! Server ──▶ publish() ───────▶ server_tx ──┤
//!                                          ▼
//!                                   Connected Clients
//! ```
//!
//! 广播是 fire-and-forget：发送即返回，不等待也不确认投递；
//! 未连接的订阅者错过的事件不会补发（客户端通过 refresh 快照自行追平）。

use shared::message::BusMessage;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::transport::MemoryTransport;
use crate::utils::AppError;

/// Configuration for transport layer
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tcp_listen_addr: String,
    /// Capacity of the broadcast channel (default: 1024)
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tcp_listen_addr: "0.0.0.0:8081".to_string(),
            channel_capacity: 1024,
        }
    }
}

/// 消息总线 - 负责消息路由和转发
///
/// # 职责
///
/// - 消息路由 (publish 广播, client_tx 上行)
/// - 传输层抽象 (TCP / Memory)
#[derive(Debug, Clone)]
pub struct MessageBus {
    /// 客户端到服务器的消息通道
    client_tx: broadcast::Sender<BusMessage>,
    /// 服务器到客户端的广播通道
    server_tx: broadcast::Sender<BusMessage>,
    /// 传输层配置
    pub(crate) config: TransportConfig,
    /// 关闭信号令牌
    shutdown_token: CancellationToken,
}

impl MessageBus {
    /// 创建默认配置的消息总线
    pub fn new() -> Self {
        Self::from_config(TransportConfig::default())
    }

    /// 从配置创建消息总线
    pub fn from_config(config: TransportConfig) -> Self {
        let capacity = config.channel_capacity;
        let (client_tx, _) = broadcast::channel(capacity);
        let (server_tx, _) = broadcast::channel(capacity);
        Self {
            client_tx,
            server_tx,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// 发布消息 (服务器 -> 所有订阅者)
    ///
    /// 没有任何订阅者时 send 会失败；广播是尽力而为，这里不视为错误。
    pub async fn publish(&self, msg: BusMessage) -> Result<(), AppError> {
        let _ = self.server_tx.send(msg);
        Ok(())
    }

    /// 订阅客户端消息 (服务器专用)
    ///
    /// MessageHandler 使用此方法接收来自客户端的请求
    pub fn subscribe_to_clients(&self) -> broadcast::Receiver<BusMessage> {
        self.client_tx.subscribe()
    }

    /// 获取内存传输层 (同进程通信，只收广播)
    ///
    /// 用于测试或同进程客户端
    pub fn memory_transport(&self) -> MemoryTransport {
        MemoryTransport::new(&self.server_tx)
    }

    /// 获取客户端内存传输层 (可发送消息到服务器)
    pub fn client_memory_transport(&self) -> MemoryTransport {
        MemoryTransport::with_client_sender(&self.server_tx, &self.client_tx)
    }

    /// 获取客户端发送端 (client→server 通道)
    pub fn sender_to_server(&self) -> &broadcast::Sender<BusMessage> {
        &self.client_tx
    }

    /// 获取广播发送端 (高级用法)
    pub fn sender(&self) -> &broadcast::Sender<BusMessage> {
        &self.server_tx
    }

    /// 获取关闭令牌 (用于监控关闭信号)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 优雅关闭消息总线
    ///
    /// 取消所有运行中的任务，包括 TCP 服务器
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::transport::Transport;
    use shared::message::EventType;

    #[tokio::test]
    async fn test_memory_transport_receives_broadcast() {
        let bus = MessageBus::new();
        let transport = bus.memory_transport();

        let entity = serde_json::json!({"id": 1});
        bus.publish(BusMessage::event(EventType::OrderPlaced, &entity))
            .await
            .unwrap();

        let received = transport.read_message().await.unwrap();
        assert_eq!(received.event_type, EventType::OrderPlaced);
        let payload: serde_json::Value = received.parse_payload().unwrap();
        assert_eq!(payload, entity);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let bus = MessageBus::new();
        let t1 = bus.memory_transport();
        let t2 = bus.memory_transport();

        bus.publish(BusMessage::event(
            EventType::ItemAdded,
            &serde_json::json!({"id": 7}),
        ))
        .await
        .unwrap();

        assert_eq!(t1.read_message().await.unwrap().event_type, EventType::ItemAdded);
        assert_eq!(t2.read_message().await.unwrap().event_type, EventType::ItemAdded);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = MessageBus::new();
        bus.publish(BusMessage::event(
            EventType::OrderBilled,
            &serde_json::json!({"id": 1}),
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_client_memory_transport_reaches_server() {
        let bus = MessageBus::new();
        let mut server_rx = bus.subscribe_to_clients();
        let client = bus.client_memory_transport();

        client
            .write_message(&BusMessage::refresh_request(EventType::RefreshOrders))
            .await
            .unwrap();

        let msg = server_rx.recv().await.unwrap();
        assert_eq!(msg.event_type, EventType::RefreshOrders);
    }
}
