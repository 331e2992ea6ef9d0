//! # Discount Repository
//!
//! Database operations for the discount catalog. Discount values are
//! exact decimals stored as TEXT and parsed at the row boundary.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::{Discount, DiscountKind};

/// Row shape for the `discounts` table; `value` stays TEXT until parsed.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    name: String,
    kind: DiscountKind,
    value: String,
    valid_from: chrono::DateTime<chrono::Utc>,
    valid_to: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl DiscountRow {
    fn into_domain(self) -> DbResult<Discount> {
        let value = Decimal::from_str(&self.value)
            .map_err(|e| DbError::corrupt("Discount", format!("value '{}': {}", self.value, e)))?;
        Ok(Discount {
            id: self.id,
            name: self.name,
            kind: self.kind,
            value,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            created_at: self.created_at,
        })
    }
}

/// Repository for discount catalog operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Inserts a discount definition.
    pub async fn insert(&self, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, name = %discount.name, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (id, name, kind, value, valid_from, valid_to, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.name)
        .bind(discount.kind)
        .bind(discount.value.to_string())
        .bind(discount.valid_from)
        .bind(discount.valid_to)
        .bind(discount.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a discount by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(
            r#"
            SELECT id, name, kind, value, valid_from, valid_to, created_at
            FROM discounts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DiscountRow::into_domain).transpose()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use meridian_core::{Discount, DiscountKind};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            name: "Spring sale".to_string(),
            kind: DiscountKind::Percentage,
            value: Decimal::new(125, 1), // 12.5%
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(30),
            created_at: now,
        };

        db.discounts().insert(&discount).await.unwrap();

        let loaded = db
            .discounts()
            .get_by_id(&discount.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.kind, DiscountKind::Percentage);
        assert_eq!(loaded.value, Decimal::new(125, 1));
        assert!(loaded.is_valid_at(now));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.discounts().get_by_id("ghost").await.unwrap().is_none());
    }
}
