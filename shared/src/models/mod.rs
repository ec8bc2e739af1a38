//! 领域实体定义
//!
//! 所有实体使用 i64 毫秒时间戳，与 SQLite 存储保持一致。

pub mod item;
pub mod order;

pub use item::{Item, ItemCreate};
pub use order::{Order, OrderAppendItems, OrderCreate, OrderStatus};
