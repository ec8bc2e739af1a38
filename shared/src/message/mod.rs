//! 消息总线消息类型定义
//!
//! 这些类型在 kds-server 和客户端之间共享，用于
//! 进程内（内存）和网络（TCP）通信。
//!
//! 事件目录（线上名称为冒号形式，与前端展示层约定一致）：
//!
//! | 方向 | 事件 | 载荷 |
//! |------|------|------|
//! | 服务端 → 全体 | `item:added` | 新建的 Item |
//! | 服务端 → 全体 | `items:bulk-update` | 导入后的完整 Item 列表 |
//! | 服务端 → 全体 | `order:placed` | 新建的 Order |
//! | 服务端 → 全体 | `order:items-added` | 追加后的完整 Order |
//! | 服务端 → 全体 | `order:status-changed` | 变更后的完整 Order |
//! | 服务端 → 全体 | `order:billed` | 结账后的完整 Order |
//! | 客户端 → 服务端 | `refresh:orders` / `refresh:items` | 空 |
//! | 服务端 → 单客户端 | `orders:refresh` / `items:refresh` | 活跃订单 / 菜品全量快照 |
//!
//! 广播载荷始终是仓储层返回的完整实体，客户端只做整体替换，不做增量合并。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// 协议版本号
pub const PROTOCOL_VERSION: u16 = 1;

/// 消息总线事件类型
///
/// u8 判别值用于 TCP 帧头的事件类型字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 握手消息
    Handshake = 0,
    /// 菜品新增
    ItemAdded = 1,
    /// 菜品批量导入
    ItemsBulkUpdate = 2,
    /// 下单
    OrderPlaced = 3,
    /// 追加菜品
    OrderItemsAdded = 4,
    /// 状态变更
    OrderStatusChanged = 5,
    /// 结账
    OrderBilled = 6,
    /// 客户端请求订单快照
    RefreshOrders = 7,
    /// 客户端请求菜品快照
    RefreshItems = 8,
    /// 订单快照应答 (单播)
    OrdersRefresh = 9,
    /// 菜品快照应答 (单播)
    ItemsRefresh = 10,
    /// 请求响应 (握手应答)
    Response = 11,
    /// 掉队重同步信号 (单播)
    Resync = 12,
}

impl EventType {
    /// 是否为客户端发起的快照请求
    pub fn is_refresh_request(&self) -> bool {
        matches!(self, EventType::RefreshOrders | EventType::RefreshItems)
    }
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Handshake),
            1 => Ok(EventType::ItemAdded),
            2 => Ok(EventType::ItemsBulkUpdate),
            3 => Ok(EventType::OrderPlaced),
            4 => Ok(EventType::OrderItemsAdded),
            5 => Ok(EventType::OrderStatusChanged),
            6 => Ok(EventType::OrderBilled),
            7 => Ok(EventType::RefreshOrders),
            8 => Ok(EventType::RefreshItems),
            9 => Ok(EventType::OrdersRefresh),
            10 => Ok(EventType::ItemsRefresh),
            11 => Ok(EventType::Response),
            12 => Ok(EventType::Resync),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Handshake => "handshake",
            EventType::ItemAdded => "item:added",
            EventType::ItemsBulkUpdate => "items:bulk-update",
            EventType::OrderPlaced => "order:placed",
            EventType::OrderItemsAdded => "order:items-added",
            EventType::OrderStatusChanged => "order:status-changed",
            EventType::OrderBilled => "order:billed",
            EventType::RefreshOrders => "refresh:orders",
            EventType::RefreshItems => "refresh:items",
            EventType::OrdersRefresh => "orders:refresh",
            EventType::ItemsRefresh => "items:refresh",
            EventType::Response => "response",
            EventType::Resync => "resync",
        };
        f.write_str(name)
    }
}

/// 消息总线消息体
///
/// - `source`: 发送方客户端 ID (服务端在读入时注入)
/// - `target`: 单播目标客户端 ID，None 表示广播给全体
/// - `correlation_id`: RPC 应答关联的请求 ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub source: Option<String>,
    pub correlation_id: Option<Uuid>,
    pub target: Option<String>,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            source: None,
            correlation_id: None,
            target: None,
            payload,
        }
    }

    /// 设置目标客户端 (单播)
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    /// 设置关联 ID (用于 RPC 响应)
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// 设置来源客户端 (TCP 接入层在读入时注入；内存客户端自行设置)
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// 创建领域事件消息，载荷为完整实体的 JSON
    pub fn event<T: Serialize>(event_type: EventType, entity: &T) -> Self {
        Self::new(
            event_type,
            serde_json::to_vec(entity).expect("Failed to serialize event payload"),
        )
    }

    /// 创建握手消息
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(
            EventType::Handshake,
            serde_json::to_vec(payload).expect("Failed to serialize handshake payload"),
        )
    }

    /// 创建快照请求消息 (refresh:orders / refresh:items)
    pub fn refresh_request(event_type: EventType) -> Self {
        debug_assert!(event_type.is_refresh_request());
        Self::new(event_type, Vec::new())
    }

    /// 创建响应消息
    pub fn response(payload: &ResponsePayload) -> Self {
        Self::new(
            EventType::Response,
            serde_json::to_vec(payload).expect("Failed to serialize response payload"),
        )
    }

    /// 创建重同步信号 (客户端掉队时单播)
    pub fn resync(payload: &ResyncPayload) -> Self {
        Self::new(
            EventType::Resync,
            serde_json::to_vec(payload).expect("Failed to serialize resync payload"),
        )
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
