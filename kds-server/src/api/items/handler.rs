//! Item API Handlers

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Deserialize;
use serde_json::json;

use shared::message::EventType;
use shared::models::ItemCreate;

use crate::core::ServerState;
use crate::db::repository::item;
use crate::utils::{AppError, AppJson, AppResult};

/// List all items, newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<shared::models::Item>>> {
    let items = item::list(&state.db).await?;
    Ok(Json(items))
}

/// Create a single item
///
/// Broadcasts `item:added` with the created item after the insert commits.
pub async fn create(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<ItemCreate>,
) -> AppResult<Json<serde_json::Value>> {
    let created = item::create(&state.db, payload).await?;

    state.broadcast_event(EventType::ItemAdded, &created).await;

    Ok(Json(json!({ "ok": true, "id": created.id })))
}

/// One CSV row; header names `code,name,price,category` in any order
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    code: Option<String>,
    name: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    category: Option<String>,
}

impl From<CsvRow> for ItemCreate {
    fn from(row: CsvRow) -> Self {
        ItemCreate {
            code: row.code,
            name: row.name,
            price: row.price,
            category: row.category,
        }
    }
}

/// Bulk import items from an uploaded CSV file
///
/// Rows are inserted best-effort in file order; the first bad row aborts
/// the import with a 500 and no rollback of rows already inserted.
/// Broadcasts `items:bulk-update` with the full catalog on success.
pub async fn upload_csv(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    // Find the csv file field
    let mut field_data: Option<Vec<u8>> = None;

    while let Some(f) = multipart.next_field().await? {
        if f.name() == Some("csv") {
            field_data = Some(f.bytes().await?.to_vec());
            break;
        }
    }

    let data = field_data
        .ok_or_else(|| AppError::validation("No 'csv' field found. Field name must be 'csv'"))?;

    let mut reader = csv::Reader::from_reader(data.as_slice());
    let rows: Vec<ItemCreate> = reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(ItemCreate::from))
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::database(format!("CSV parse error: {e}")))?;

    let inserted = item::bulk_insert(&state.db, rows)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let items = item::list(&state.db).await?;
    state
        .broadcast_event(EventType::ItemsBulkUpdate, &items)
        .await;

    Ok(Json(json!({ "ok": true, "inserted": inserted })))
}
