//! # Loyalty Repository
//!
//! Database operations for customer loyalty point balances.
//!
//! The ledger is debited exactly once per checkout, inside the checkout
//! transaction; Draft-cart point redemption only reads the balance.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::LoyaltyAccount;

/// Repository for loyalty ledger operations.
#[derive(Debug, Clone)]
pub struct LoyaltyRepository {
    pool: SqlitePool,
}

impl LoyaltyRepository {
    /// Creates a new LoyaltyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyRepository { pool }
    }

    /// Creates a loyalty account with an initial balance.
    pub async fn create_account(&self, customer_id: &str, balance: i64) -> DbResult<()> {
        debug!(customer_id = %customer_id, balance = %balance, "Creating loyalty account");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO loyalty_accounts (customer_id, balance, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
        )
        .bind(customer_id)
        .bind(balance)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a loyalty account by customer ID.
    pub async fn get(&self, customer_id: &str) -> DbResult<Option<LoyaltyAccount>> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(
            r#"
            SELECT customer_id, balance, created_at, updated_at
            FROM loyalty_accounts
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Gets a customer's point balance.
    ///
    /// Returns `None` when the customer has no ledger account, which is
    /// distinct from a zero balance: redemption against a missing account
    /// is a precondition failure, not a free pass.
    pub async fn get_balance(&self, customer_id: &str) -> DbResult<Option<i64>> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM loyalty_accounts WHERE customer_id = ?1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance)
    }

    /// Credits earned points to an existing account.
    pub async fn credit(&self, customer_id: &str, points: i64) -> DbResult<()> {
        debug!(customer_id = %customer_id, points = %points, "Crediting loyalty points");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE loyalty_accounts SET
                balance = balance + ?2,
                updated_at = ?3
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(points)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LoyaltyAccount", customer_id));
        }

        Ok(())
    }

    /// Adjusts a balance by `delta` inside a caller-owned transaction.
    ///
    /// Used by checkout to debit redeemed points (negative delta). Fails
    /// with `NotFound` when the account is missing, aborting the
    /// surrounding transaction.
    pub async fn adjust(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(customer_id = %customer_id, delta = %delta, "Adjusting loyalty balance");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE loyalty_accounts SET
                balance = balance + ?2,
                updated_at = ?3
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LoyaltyAccount", customer_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_get_balance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.loyalty().create_account("cust-1", 5000).await.unwrap();

        assert_eq!(db.loyalty().get_balance("cust-1").await.unwrap(), Some(5000));
        assert_eq!(db.loyalty().get_balance("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credit_and_adjust() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.loyalty().create_account("cust-1", 1000).await.unwrap();

        db.loyalty().credit("cust-1", 500).await.unwrap();
        assert_eq!(db.loyalty().get_balance("cust-1").await.unwrap(), Some(1500));

        let mut tx = db.pool().begin().await.unwrap();
        db.loyalty().adjust(&mut tx, "cust-1", -700).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(db.loyalty().get_balance("cust-1").await.unwrap(), Some(800));
    }

    #[tokio::test]
    async fn test_adjust_missing_account_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert!(db.loyalty().adjust(&mut tx, "ghost", -100).await.is_err());
    }

    #[tokio::test]
    async fn test_rolled_back_adjust_leaves_balance() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.loyalty().create_account("cust-1", 1000).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        db.loyalty().adjust(&mut tx, "cust-1", -999).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(db.loyalty().get_balance("cust-1").await.unwrap(), Some(1000));
    }
}
