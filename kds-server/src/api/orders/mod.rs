//! Order API Module
//!
//! Placement, append, status transitions and billing for kitchen orders.
//! Every mutation broadcasts a domain event after the write commits.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::place))
        // Keyed by table, not order id: appends to the table's current order
        .route("/{table_no}/add-items", post(handler::add_items))
        .route("/{id}/status", post(handler::set_status))
        .route("/{id}/bill", post(handler::bill))
}
