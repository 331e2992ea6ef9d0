//! # Item Repository
//!
//! Database operations for inventory items: catalog reads, price lookups
//! for cart snapshots, and the transactional stock decrement used by
//! checkout.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::{Item, Money};

/// Repository for inventory item operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts an item into the catalog.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, sku = %item.sku, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, sku, name, price_cents, stock, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.stock)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, price_cents, stock, is_active, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets the current catalog price of an item.
    ///
    /// Fails with `NotFound` if the item does not exist; the cart layer
    /// snapshots this price onto the line item.
    pub async fn price_of(&self, id: &str) -> DbResult<Money> {
        let price: Option<i64> = sqlx::query_scalar("SELECT price_cents FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        price
            .map(Money::from_cents)
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Decrements an item's stock inside a caller-owned transaction.
    ///
    /// Fails with `NotFound` when the item row is missing, which aborts
    /// the surrounding checkout transaction. Stock may go negative; the
    /// low-stock report is the operational safety net.
    pub async fn decrement_stock(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Decrementing stock");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE items SET
                stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Lists active items with stock at or below `threshold`.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, sku, name, price_cents, stock, is_active, created_at, updated_at
            FROM items
            WHERE is_active = 1 AND stock <= ?1
            ORDER BY stock, sku
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use meridian_core::Item;
    use uuid::Uuid;

    fn test_item(sku: &str, price_cents: i64, stock: i64) -> Item {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: format!("Item {}", sku),
            price_cents,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = test_item("COKE-330", 299, 10);

        db.items().insert(&item).await.unwrap();

        let loaded = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.sku, "COKE-330");
        assert_eq!(loaded.price_cents, 299);
        assert_eq!(loaded.stock, 10);

        assert_eq!(db.items().price_of(&item.id).await.unwrap().cents(), 299);
    }

    #[tokio::test]
    async fn test_price_of_missing_item() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.items().price_of("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_decrement_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = test_item("CHIPS-01", 249, 10);
        db.items().insert(&item).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        db.items()
            .decrement_stock(&mut tx, &item.id, 3)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let loaded = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.stock, 7);
    }

    #[tokio::test]
    async fn test_decrement_missing_item_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let result = db.items().decrement_stock(&mut tx, "ghost", 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&test_item("LOW-1", 100, 2)).await.unwrap();
        db.items().insert(&test_item("LOW-2", 100, 5)).await.unwrap();
        db.items().insert(&test_item("OK-1", 100, 50)).await.unwrap();

        let low = db.items().low_stock(5).await.unwrap();
        let skus: Vec<_> = low.iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["LOW-1", "LOW-2"]);
    }
}
