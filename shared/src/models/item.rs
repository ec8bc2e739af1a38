//! Item Model (菜单项)

use serde::{Deserialize, Serialize};

/// Menu item entity
///
/// 创建后不可修改，只能通过批量导入追加。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Item {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// SQLite 无精确小数类型，金额与 orders 归档一致使用 f64
    pub price: f64,
    pub category: String,
    pub created_at: i64,
}

/// Create item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreate {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}
