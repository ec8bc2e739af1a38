//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`items`] - 菜品管理接口 (含 CSV 导入)
//! - [`orders`] - 订单管理接口

pub mod health;
pub mod items;
pub mod orders;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
