//! KDS Server - 厨房显示系统后端
//!
//! # 架构概述
//!
//! 本模块是 KDS Server 的主入口，提供以下核心功能：
//!
//! - **消息总线** (`message`): 支持 TCP/Memory 传输的实时消息系统
//! - **数据库** (`db`): 嵌入式 SQLite 存储 (菜品目录 + 订单)
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! kds-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (连接 + 仓储)
//! ├── message/       # 消息总线
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod message;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use message::{BusMessage, EventType};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 设置运行环境 (dotenv, 工作目录, 日志)
///
/// 必须在加载配置之前调用，以便 `.env` 中的变量生效
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    // 开发环境默认 debug 级别，LOG_LEVEL 可覆盖
    let default_level = if config.is_development() { "debug" } else { "info" };
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string());
    let log_dir = config.log_dir();
    init_logger_with_file(Some(log_level.as_str()), log_dir.to_str());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __ __ ____  _____
   / //_// __ \/ ___/
  / ,<  / / / /\__ \
 / /| |/ /_/ /___/ /
/_/ |_/_____//____/
    "#
    );
}
