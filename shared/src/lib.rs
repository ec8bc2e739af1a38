//! KDS 共享类型库
//!
//! 服务端 (kds-server) 和客户端之间共享的类型定义：
//!
//! - **模型** (`models`): 菜品、订单等领域实体
//! - **消息** (`message`): 消息总线的线上类型 (BusMessage, EventType)
//! - **工具** (`util`): 时间戳等通用函数
//!
//! 启用 `db` 特性后，实体附带 `sqlx::FromRow` 派生，供服务端直接映射查询结果。

pub mod message;
pub mod models;
pub mod util;

pub use message::{BusMessage, EventType};
pub use models::{Item, ItemCreate, Order, OrderStatus};
