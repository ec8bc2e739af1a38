//! Order Repository
//!
//! Single writer for the orders table. Line items are stored as one JSON
//! blob (`items_json`); `append_items` is a read-modify-write over that
//! blob, so two concurrent appends to the same order are last-write-wins.
//! Not safe under real concurrent appends to one table.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

const SELECT_COLUMNS: &str =
    "id, table_no, items_json, special_requests, status, archived, created_at";

/// Raw orders row, items still serialized
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    table_no: String,
    items_json: String,
    special_requests: String,
    status: String,
    archived: bool,
    created_at: i64,
}

impl OrderRow {
    /// 展开 items_json；解析失败或为空时回退为空序列
    fn into_order(self) -> Order {
        let items = serde_json::from_str(&self.items_json).unwrap_or_default();
        let status = self.status.parse().unwrap_or(OrderStatus::Placed);
        Order {
            id: self.id,
            table_no: self.table_no,
            items,
            special_requests: self.special_requests,
            status,
            archived: self.archived,
            created_at: self.created_at,
        }
    }
}

/// List all non-archived orders, newest first
///
/// `status` filters to exactly one status; an unrecognized filter value is a
/// validation error rather than an empty result.
pub async fn list_active(pool: &SqlitePool, status: Option<&str>) -> RepoResult<Vec<Order>> {
    let status = match status {
        Some(s) => Some(
            s.parse::<OrderStatus>()
                .map_err(|_| RepoError::Validation(format!("Unknown status filter: {s}")))?,
        ),
        None => None,
    };

    let rows: Vec<OrderRow> = match status {
        Some(status) => {
            sqlx::query_as(&format!(
                "SELECT {SELECT_COLUMNS} FROM orders WHERE archived = 0 AND status = ? ORDER BY created_at DESC, id DESC",
            ))
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {SELECT_COLUMNS} FROM orders WHERE archived = 0 ORDER BY created_at DESC, id DESC",
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(OrderRow::into_order).collect())
}

/// Find order by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let row: Option<OrderRow> =
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(OrderRow::into_order))
}

/// Place a new order (status = placed)
///
/// Zero items is valid. The returned order carries `items` exactly as given,
/// not re-read through the serialized column.
pub async fn create(
    pool: &SqlitePool,
    table_no: &str,
    items: Vec<serde_json::Value>,
    special_requests: &str,
) -> RepoResult<Order> {
    if table_no.trim().is_empty() {
        return Err(RepoError::Validation("table_no is required".into()));
    }

    let items_json = serde_json::to_string(&items)
        .map_err(|e| RepoError::Database(format!("Failed to serialize items: {e}")))?;
    let now = now_millis();

    let result = sqlx::query(
        "INSERT INTO orders (table_no, items_json, special_requests, status, archived, created_at) VALUES (?, ?, ?, 'placed', 0, ?)",
    )
    .bind(table_no)
    .bind(&items_json)
    .bind(special_requests)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Order {
        id: result.last_insert_rowid(),
        table_no: table_no.to_string(),
        items,
        special_requests: special_requests.to_string(),
        status: OrderStatus::Placed,
        archived: false,
        created_at: now,
    })
}

/// Append items to the table's current active order
///
/// Targets the most recently created active order for `table_no` only; if
/// several are active the older ones are left untouched. New items go after
/// the existing ones, special requests are joined with "; " when the new
/// text is non-empty, and the status drops back to `placed` so the added
/// items re-enter the preparation pipeline.
pub async fn append_items(
    pool: &SqlitePool,
    table_no: &str,
    items: Vec<serde_json::Value>,
    special_requests: Option<&str>,
) -> RepoResult<Order> {
    if items.is_empty() {
        return Err(RepoError::Validation("items must be a non-empty array".into()));
    }

    let row: Option<OrderRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM orders WHERE table_no = ? AND archived = 0 ORDER BY created_at DESC, id DESC LIMIT 1",
    ))
    .bind(table_no)
    .fetch_optional(pool)
    .await?;

    let order = row
        .map(OrderRow::into_order)
        .ok_or_else(|| RepoError::NotFound(format!("No active order for table {table_no}")))?;

    let mut merged_items = order.items;
    merged_items.extend(items);

    let mut merged_requests = order.special_requests;
    if let Some(extra) = special_requests
        && !extra.trim().is_empty()
    {
        if merged_requests.is_empty() {
            merged_requests = extra.to_string();
        } else {
            merged_requests = format!("{merged_requests}; {extra}");
        }
    }

    let items_json = serde_json::to_string(&merged_items)
        .map_err(|e| RepoError::Database(format!("Failed to serialize items: {e}")))?;

    sqlx::query(
        "UPDATE orders SET items_json = ?, special_requests = ?, status = 'placed' WHERE id = ?",
    )
    .bind(&items_json)
    .bind(&merged_requests)
    .bind(order.id)
    .execute(pool)
    .await?;

    Ok(Order {
        id: order.id,
        table_no: order.table_no,
        items: merged_items,
        special_requests: merged_requests,
        status: OrderStatus::Placed,
        archived: order.archived,
        created_at: order.created_at,
    })
}

/// Change order status
///
/// Archives the order only when the new status is `archived`. Setting
/// `billed` through here deliberately does NOT archive; only [`bill`]
/// does. The two paths are distinct and kept so.
pub async fn set_status(pool: &SqlitePool, id: i64, status: &str) -> RepoResult<Order> {
    let status = status
        .parse::<OrderStatus>()
        .map_err(|_| RepoError::Validation(format!("Unknown status: {status}")))?;

    let result = sqlx::query(
        "UPDATE orders SET status = ?, archived = CASE WHEN ? = 'archived' THEN 1 ELSE archived END WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}

/// Bill the order: status = billed AND archived = 1
///
/// The only path that both finalizes billing and archives.
pub async fn bill(pool: &SqlitePool, id: i64) -> RepoResult<Order> {
    let result = sqlx::query("UPDATE orders SET status = 'billed', archived = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}
