//! Item Repository
//!
//! Append-only menu catalog: rows are inserted singly or in bulk via CSV
//! import and never updated or deleted.

use super::{RepoError, RepoResult};
use shared::models::{Item, ItemCreate};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// List all items, newest id first
pub async fn list(pool: &SqlitePool) -> RepoResult<Vec<Item>> {
    let items: Vec<Item> = sqlx::query_as(
        "SELECT id, code, name, price, category, created_at FROM items ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Create a single item
pub async fn create(pool: &SqlitePool, data: ItemCreate) -> RepoResult<Item> {
    let name = data.name.trim().to_string();
    if name.is_empty() {
        return Err(RepoError::Validation("name is required".into()));
    }

    let price = data.price.unwrap_or(0.0);
    if price < 0.0 {
        return Err(RepoError::Validation("price must be >= 0".into()));
    }

    let code = data.code.unwrap_or_default();
    let category = data.category.unwrap_or_default();
    let now = now_millis();

    let result = sqlx::query(
        "INSERT INTO items (code, name, price, category, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&code)
    .bind(&name)
    .bind(price)
    .bind(&category)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Item {
        id: result.last_insert_rowid(),
        code,
        name,
        price,
        category,
        created_at: now,
    })
}

/// Bulk insert items (best-effort)
///
/// Rows are inserted one by one; the first failure aborts and is reported
/// whole, with no rollback of rows already inserted.
pub async fn bulk_insert(pool: &SqlitePool, rows: Vec<ItemCreate>) -> RepoResult<u64> {
    let mut inserted = 0u64;
    for row in rows {
        create(pool, row).await?;
        inserted += 1;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Create an in-memory SQLite pool with the items schema.
    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            // Each in-memory connection is a separate database
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL,
                price REAL NOT NULL DEFAULT 0,
                category TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    fn item(name: &str) -> ItemCreate {
        ItemCreate {
            code: None,
            name: name.to_string(),
            price: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let pool = test_pool().await;

        let mut last_id = 0;
        for name in ["espresso", "latte", "mocha"] {
            let created = create(&pool, item(name)).await.unwrap();
            assert!(created.id > last_id);
            last_id = created.id;
        }
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let pool = test_pool().await;

        let created = create(&pool, item("espresso")).await.unwrap();
        assert_eq!(created.code, "");
        assert_eq!(created.price, 0.0);
        assert_eq!(created.category, "");
    }

    #[tokio::test]
    async fn test_rejects_blank_name_and_negative_price() {
        let pool = test_pool().await;

        let err = create(&pool, item("   ")).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        let mut bad = item("espresso");
        bad.price = Some(-1.0);
        let err = create(&pool, bad).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_descending_id() {
        let pool = test_pool().await;

        create(&pool, item("a")).await.unwrap();
        create(&pool, item("b")).await.unwrap();

        let items = list(&pool).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "b");
        assert_eq!(items[1].name, "a");
    }

    #[tokio::test]
    async fn test_bulk_insert_aborts_on_first_bad_row() {
        let pool = test_pool().await;

        let rows = vec![item("a"), item(""), item("c")];
        let err = bulk_insert(&pool, rows).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        // Best-effort: the row before the failure stays inserted
        let items = list(&pool).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "a");
    }
}
