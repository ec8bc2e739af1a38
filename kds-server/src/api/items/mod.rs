//! Item API Module
//!
//! Menu catalog endpoints. Items are append-only: they can be listed,
//! created one at a time, or imported in bulk from a CSV file.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Item router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/items", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/upload-csv", post(handler::upload_csv))
}
