//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;

use shared::message::EventType;
use shared::models::{Order, OrderAppendItems, OrderCreate};

use crate::core::ServerState;
use crate::db::repository::order;
use crate::utils::{AppJson, AppResult};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional status filter (placed | preparing | ready | billed)
    pub status: Option<String>,
}

/// List active orders, optionally filtered by status
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order::list_active(&state.db, query.status.as_deref()).await?;
    Ok(Json(orders))
}

/// Place a new order
///
/// Broadcasts `order:placed` with the created order.
pub async fn place(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<OrderCreate>,
) -> AppResult<Json<serde_json::Value>> {
    let created = order::create(
        &state.db,
        &payload.table_no,
        payload.items,
        payload.special_requests.as_deref().unwrap_or(""),
    )
    .await?;

    state.broadcast_event(EventType::OrderPlaced, &created).await;

    Ok(Json(json!({ "ok": true, "id": created.id })))
}

/// Append items to the table's current active order
///
/// Broadcasts `order:items-added` with the updated order.
pub async fn add_items(
    State(state): State<ServerState>,
    Path(table_no): Path<String>,
    AppJson(payload): AppJson<OrderAppendItems>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = order::append_items(
        &state.db,
        &table_no,
        payload.items,
        payload.special_requests.as_deref(),
    )
    .await?;

    state
        .broadcast_event(EventType::OrderItemsAdded, &updated)
        .await;

    Ok(Json(json!({ "ok": true, "order": updated })))
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// Change order status
///
/// Broadcasts `order:status-changed` with the updated order.
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<SetStatusRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = order::set_status(&state.db, id, &payload.status).await?;

    state
        .broadcast_event(EventType::OrderStatusChanged, &updated)
        .await;

    Ok(Json(json!({ "ok": true })))
}

/// Bill an order (marks billed and archives it)
///
/// Broadcasts `order:billed` with the final order.
pub async fn bill(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let billed = order::bill(&state.db, id).await?;

    state.broadcast_event(EventType::OrderBilled, &billed).await;

    Ok(Json(json!({ "ok": true })))
}
