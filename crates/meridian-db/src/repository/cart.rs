//! # Cart Repository
//!
//! Database operations for the cart aggregate: the cart row plus its
//! ordered child rows (line items and applied discounts).
//!
//! ## Persistence Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  carts            1 row per cart (status, parties, cached totals)       │
//! │  cart_items       N rows, position = display order, snapshot columns    │
//! │  cart_discounts   N rows, position = STACKING order, snapshot columns   │
//! │                                                                         │
//! │  Writes to a Draft cart replace the child rows wholesale; the           │
//! │  aggregate is small and totals are recomputed from scratch anyway.      │
//! │                                                                         │
//! │  Status-guarded updates (WHERE status = 'draft') turn a lost race       │
//! │  against checkout into a NotFound instead of silent corruption.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::{AppliedDiscount, Cart, CartStatus, DiscountKind, LineItem};

/// Row shape for the `carts` table.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: String,
    cashier_id: String,
    customer_id: Option<String>,
    status: CartStatus,
    points_redeemed: i64,
    items_total_cents: i64,
    discount_total_cents: i64,
    vat_amount_cents: i64,
    grand_total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

/// Row shape for `cart_discounts`; `value` stays TEXT until parsed.
#[derive(Debug, sqlx::FromRow)]
struct CartDiscountRow {
    discount_id: String,
    name: String,
    kind: DiscountKind,
    value: String,
}

impl CartDiscountRow {
    fn into_domain(self) -> DbResult<AppliedDiscount> {
        let value = Decimal::from_str(&self.value).map_err(|e| {
            DbError::corrupt("AppliedDiscount", format!("value '{}': {}", self.value, e))
        })?;
        Ok(AppliedDiscount {
            discount_id: self.discount_id,
            name: self.name,
            kind: self.kind,
            value,
        })
    }
}

/// Repository for cart aggregate operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Inserts a new cart with its child rows.
    pub async fn insert(&self, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, cashier_id = %cart.cashier_id, "Inserting cart");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (
                id, cashier_id, customer_id, status, points_redeemed,
                items_total_cents, discount_total_cents, vat_amount_cents, grand_total_cents,
                created_at, updated_at, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.cashier_id)
        .bind(&cart.customer_id)
        .bind(cart.status)
        .bind(cart.points_redeemed)
        .bind(cart.items_total_cents)
        .bind(cart.discount_total_cents)
        .bind(cart.vat_amount_cents)
        .bind(cart.grand_total_cents)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .bind(cart.paid_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_children(&mut tx, cart).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Loads a cart with its ordered child rows, any status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT id, cashier_id, customer_id, status, points_redeemed,
                   items_total_cents, discount_total_cents, vat_amount_cents, grand_total_cents,
                   created_at, updated_at, paid_at
            FROM carts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT item_id, sku, name, unit_price_cents, quantity, line_total_cents
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let discount_rows = sqlx::query_as::<_, CartDiscountRow>(
            r#"
            SELECT discount_id, name, kind, value
            FROM cart_discounts
            WHERE cart_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let discounts = discount_rows
            .into_iter()
            .map(CartDiscountRow::into_domain)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Some(Cart {
            id: row.id,
            cashier_id: row.cashier_id,
            customer_id: row.customer_id,
            status: row.status,
            items,
            discounts,
            points_redeemed: row.points_redeemed,
            items_total_cents: row.items_total_cents,
            discount_total_cents: row.discount_total_cents,
            vat_amount_cents: row.vat_amount_cents,
            grand_total_cents: row.grand_total_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
            paid_at: row.paid_at,
        }))
    }

    /// Persists the current state of a Draft cart.
    ///
    /// Child rows are replaced wholesale. Fails with `NotFound` when the
    /// cart row is missing or no longer Draft; the whole write rolls
    /// back in that case.
    pub async fn update_draft(&self, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, "Updating draft cart");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE carts SET
                customer_id = ?2,
                points_redeemed = ?3,
                items_total_cents = ?4,
                discount_total_cents = ?5,
                vat_amount_cents = ?6,
                grand_total_cents = ?7,
                updated_at = ?8
            WHERE id = ?1 AND status = 'draft'
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.customer_id)
        .bind(cart.points_redeemed)
        .bind(cart.items_total_cents)
        .bind(cart.discount_total_cents)
        .bind(cart.vat_amount_cents)
        .bind(cart.grand_total_cents)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart (draft)", cart.id.clone()));
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cart_discounts WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        Self::insert_children(&mut tx, cart).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Transitions a cart to Paid inside a caller-owned transaction.
    ///
    /// Persists the authoritative totals recomputed at checkout time.
    /// Fails with `NotFound` when the row is missing or no longer Draft,
    /// aborting the surrounding checkout transaction.
    pub async fn mark_paid(&self, conn: &mut SqliteConnection, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, grand_total = %cart.grand_total_cents, "Marking cart paid");

        let result = sqlx::query(
            r#"
            UPDATE carts SET
                status = 'paid',
                items_total_cents = ?2,
                discount_total_cents = ?3,
                vat_amount_cents = ?4,
                grand_total_cents = ?5,
                paid_at = ?6,
                updated_at = ?6
            WHERE id = ?1 AND status = 'draft'
            "#,
        )
        .bind(&cart.id)
        .bind(cart.items_total_cents)
        .bind(cart.discount_total_cents)
        .bind(cart.vat_amount_cents)
        .bind(cart.grand_total_cents)
        .bind(cart.paid_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart (draft)", cart.id.clone()));
        }

        Ok(())
    }

    /// Transitions a Paid cart to Confirmed.
    ///
    /// The reconciliation trigger lives outside the engine; this is the
    /// hook it calls. Confirmed carts are read-only from then on.
    pub async fn mark_confirmed(&self, cart_id: &str) -> DbResult<()> {
        debug!(id = %cart_id, "Marking cart confirmed");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE carts SET
                status = 'confirmed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'paid'
            "#,
        )
        .bind(cart_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart (paid)", cart_id));
        }

        Ok(())
    }

    /// Inserts child rows for a cart; positions follow list order.
    async fn insert_children(conn: &mut SqliteConnection, cart: &Cart) -> DbResult<()> {
        for (position, line) in cart.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (
                    cart_id, position, item_id, sku, name,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&cart.id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents)
            .execute(&mut *conn)
            .await?;
        }

        for (position, discount) in cart.discounts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_discounts (cart_id, position, discount_id, name, kind, value)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&cart.id)
            .bind(position as i64)
            .bind(&discount.discount_id)
            .bind(&discount.name)
            .bind(discount.kind)
            .bind(discount.value.to_string())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
