//! Order Model (桌台订单)
//!
//! 行项目 (line item) 不做结构校验，以 `serde_json::Value` 原样存储。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Preparing,
    Ready,
    Billed,
    Archived,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Billed => "billed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "billed" => Ok(Self::Billed),
            "archived" => Ok(Self::Archived),
            _ => Err(()),
        }
    }
}

/// Order entity
///
/// `items` 在存储层序列化为 `items_json` 列，读取时反序列化；
/// 解析失败或为空时回退为空序列，永远不为 null。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub table_no: String,
    pub items: Vec<serde_json::Value>,
    pub special_requests: String,
    pub status: OrderStatus,
    pub archived: bool,
    pub created_at: i64,
}

/// Place order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_no: String,
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// Append items payload (追加菜品到桌台当前订单)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAppendItems {
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["placed", "preparing", "ready", "billed", "archived"] {
            let status: OrderStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!("cancelled".parse::<OrderStatus>().is_err());
        assert!("PLACED".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Ready).unwrap();
        assert_eq!(json, "\"ready\"");
        let back: OrderStatus = serde_json::from_str("\"billed\"").unwrap();
        assert_eq!(back, OrderStatus::Billed);
    }
}
