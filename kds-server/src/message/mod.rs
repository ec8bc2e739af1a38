//! 实时消息模块
//!
//! 负责把领域事件推送给所有连接的客户端，并应答单客户端的快照请求。
//!
//! - [`bus`]: 消息总线核心 (双 broadcast 通道)
//! - [`transport`]: 可插拔传输层 (TCP / Memory)
//! - [`tcp_server`]: TCP 接入、握手、消息转发
//! - [`handler`]: 服务端消息处理 (refresh:orders / refresh:items 快照应答)

pub mod bus;
pub mod handler;
pub mod tcp_server;
pub mod transport;

pub use bus::{MessageBus, TransportConfig};
pub use handler::MessageHandler;
pub use shared::message::{BusMessage, EventType};
