//! 工具模块 - 错误类型、日志、通用 Result
//!
//! - [`AppError`] - 应用错误类型 (HTTP 边界)
//! - [`AppResult`] - HTTP 处理器的 Result 别名
//! - [`AppJson`] - 请求体提取器 (拒绝 -> 400)
//! - [`logger`] - tracing 初始化

pub mod error;
pub mod extract;
pub mod logger;
pub mod result;

pub use error::AppError;
pub use extract::AppJson;
pub use result::AppResult;
