//! End-to-end tests for the HTTP API + realtime broadcast contract.
//!
//! Each mutating endpoint must emit exactly one domain event after the
//! write commits, and failed validation must emit nothing. The snapshot
//! protocol (refresh:orders / refresh:items) must reply only to the
//! requesting client with the request id echoed as correlation id.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use kds_server::core::server::build_app;
use kds_server::message::MessageBus;
use kds_server::message::transport::{MemoryTransport, Transport};
use kds_server::{Config, EventType, ServerState};
use shared::message::BusMessage;
use shared::models::Order;

/// Build a state over an in-memory database with the real migrations
async fn test_state() -> ServerState {
    let pool = SqlitePoolOptions::new()
        // Each in-memory connection is a separate database
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let config = Config::with_overrides("./kds-data-test", 0, 0);
    ServerState::new(config, pool, Arc::new(MessageBus::new()))
}

fn app(state: &ServerState) -> axum::Router {
    build_app("public").with_state(state.clone())
}

async fn post_json(state: &ServerState, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(state: &ServerState, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Assert no further message arrives within a short window
async fn assert_no_message(transport: &MemoryTransport) {
    let result = tokio::time::timeout(Duration::from_millis(100), transport.read_message()).await;
    assert!(result.is_err(), "expected no message, got {:?}", result);
}

#[tokio::test]
async fn test_place_order_broadcasts_exactly_one_event() {
    let state = test_state().await;
    let transport = state.message_bus().memory_transport();

    let (status, body) = post_json(
        &state,
        "/api/orders",
        json!({
            "table_no": "T1",
            "items": [{"name": "Espresso", "qty": 2}],
            "special_requests": "no sugar"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    let id = body["id"].as_i64().unwrap();
    assert!(id > 0);

    let msg = transport.read_message().await.unwrap();
    assert_eq!(msg.event_type, EventType::OrderPlaced);
    let order: Order = msg.parse_payload().unwrap();
    assert_eq!(order.id, id);
    assert_eq!(order.table_no, "T1");
    assert_eq!(order.special_requests, "no sugar");

    assert_no_message(&transport).await;
}

#[tokio::test]
async fn test_validation_failure_emits_nothing() {
    let state = test_state().await;
    let transport = state.message_bus().memory_transport();

    let (status, body) = post_json(
        &state,
        "/api/orders",
        json!({"table_no": "   ", "items": []}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert_no_message(&transport).await;
}

#[tokio::test]
async fn test_status_change_and_bill_lifecycle() {
    let state = test_state().await;

    let (_, body) = post_json(
        &state,
        "/api/orders",
        json!({"table_no": "T2", "items": [{"name": "Latte"}]}),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let transport = state.message_bus().memory_transport();

    let (status, body) = post_json(
        &state,
        &format!("/api/orders/{id}/status"),
        json!({"status": "ready"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let msg = transport.read_message().await.unwrap();
    assert_eq!(msg.event_type, EventType::OrderStatusChanged);
    let order: Order = msg.parse_payload().unwrap();
    assert_eq!(order.status.as_str(), "ready");

    let (status, _) = post_json(&state, &format!("/api/orders/{id}/bill"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let msg = transport.read_message().await.unwrap();
    assert_eq!(msg.event_type, EventType::OrderBilled);
    let order: Order = msg.parse_payload().unwrap();
    assert!(order.archived);

    // Billed orders leave the active list
    let (status, body) = get_json(&state, "/api/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // Appending to the billed table fails: no active order left
    let (status, body) = post_json(
        &state,
        "/api/orders/T2/add-items",
        json!({"items": [{"name": "Tea"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_items_field_is_bad_request() {
    let state = test_state().await;
    let transport = state.message_bus().memory_transport();

    // items absent entirely: body rejection surfaces as 400 {"error": ...}
    let (status, body) = post_json(&state, "/api/orders", json!({"table_no": "T2"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_no_message(&transport).await;

    // An explicitly-present empty array is a valid zero-item order
    let (status, body) = post_json(
        &state,
        "/api/orders",
        json!({"table_no": "T2", "items": []}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn test_unknown_status_rejected() {
    let state = test_state().await;

    let (_, body) = post_json(
        &state,
        "/api/orders",
        json!({"table_no": "T3", "items": [{"name": "Mocha"}]}),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &state,
        &format!("/api/orders/{id}/status"),
        json!({"status": "flying"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_add_items_targets_newest_active_order() {
    let state = test_state().await;

    post_json(
        &state,
        "/api/orders",
        json!({"table_no": "T4", "items": [{"name": "Espresso"}]}),
    )
    .await;

    let transport = state.message_bus().memory_transport();

    let (status, body) = post_json(
        &state,
        "/api/orders/T4/add-items",
        json!({"items": [{"name": "Croissant"}], "special_requests": "warm"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    let order: Order = serde_json::from_value(body["order"].clone()).unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.special_requests, "warm");
    assert_eq!(order.status.as_str(), "placed");

    let msg = transport.read_message().await.unwrap();
    assert_eq!(msg.event_type, EventType::OrderItemsAdded);

    // No active order for an unknown table
    let (status, _) = post_json(
        &state,
        "/api/orders/T99/add-items",
        json!({"items": [{"name": "Tea"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_create_and_csv_import_broadcasts() {
    let state = test_state().await;
    let transport = state.message_bus().memory_transport();

    let (status, body) = post_json(
        &state,
        "/api/items",
        json!({"code": "E1", "name": "Espresso", "price": 2.5, "category": "coffee"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));

    let msg = transport.read_message().await.unwrap();
    assert_eq!(msg.event_type, EventType::ItemAdded);

    // CSV import
    let csv = "code,name,price,category\nL1,Latte,3.0,coffee\nM1,Mocha,3.5,coffee\n";
    let boundary = "kds-test-boundary";
    let multipart_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"csv\"; filename=\"items.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/items/upload-csv")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body))
        .unwrap();

    let response = app(&state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["inserted"], json!(2));

    let msg = transport.read_message().await.unwrap();
    assert_eq!(msg.event_type, EventType::ItemsBulkUpdate);
    let items: Vec<shared::models::Item> = msg.parse_payload().unwrap();
    assert_eq!(items.len(), 3);

    assert_no_message(&transport).await;
}

#[tokio::test]
async fn test_snapshot_request_is_answered_per_client() {
    let state = test_state().await;
    // Handler subscribes before any request is sent
    state.start_background_tasks();

    post_json(
        &state,
        "/api/orders",
        json!({"table_no": "T5", "items": [{"name": "Espresso"}]}),
    )
    .await;

    let bus = state.message_bus();
    let observer = bus.memory_transport();
    let client = bus.client_memory_transport();

    let request = BusMessage::refresh_request(EventType::RefreshOrders).with_source("client-1");
    let request_id = request.request_id;
    client.write_message(&request).await.unwrap();

    // Skip the order:placed broadcast if the observer sees one
    let reply = loop {
        let msg = tokio::time::timeout(Duration::from_secs(1), observer.read_message())
            .await
            .expect("no snapshot reply")
            .unwrap();
        if msg.event_type == EventType::OrdersRefresh {
            break msg;
        }
    };

    assert_eq!(reply.target.as_deref(), Some("client-1"));
    assert_eq!(reply.correlation_id, Some(request_id));
    let orders: Vec<Order> = reply.parse_payload().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].table_no, "T5");
}

#[tokio::test]
async fn test_snapshot_request_without_source_is_dropped() {
    let state = test_state().await;
    state.start_background_tasks();

    let bus = state.message_bus();
    let observer = bus.memory_transport();
    let client = bus.client_memory_transport();

    client
        .write_message(&BusMessage::refresh_request(EventType::RefreshItems))
        .await
        .unwrap();

    assert_no_message(&observer).await;
}
