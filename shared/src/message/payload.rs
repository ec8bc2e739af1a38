use serde::{Deserialize, Serialize};

/// 握手载荷 (客户端 -> 服务端)
///
/// 包含客户端的协议版本信息，用于服务端进行版本校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// 协议版本
    pub version: u16,
    /// 客户端名称/标识
    pub client_name: Option<String>,
    /// 客户端唯一标识 (UUID)，缺省时由服务端分配
    pub client_id: Option<String>,
}

/// 通用响应载荷 (服务端 -> 客户端)
///
/// 用于握手应答等 RPC 响应。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// 是否成功
    pub success: bool,
    /// 响应消息/错误描述
    pub message: String,
    /// 响应数据 (可选)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ResponsePayload {
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// 重同步信号载荷 (服务端 -> 掉队客户端)
///
/// 客户端收到后应发起 `refresh:orders` / `refresh:items` 拉取全量快照。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResyncPayload {
    /// 掉队原因 (例如 "lagged")
    pub reason: String,
    /// 被丢弃的广播消息数
    pub dropped_messages: u64,
}
