//! # Settings Repository
//!
//! Database operations for the single-row runtime settings: the VAT rate
//! and the low-stock threshold. The settings cache in meridian-checkout
//! sits in front of this repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::Settings;

/// Row shape for the `settings` table; `vat_rate` stays TEXT until parsed.
#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    vat_rate: String,
    low_stock_threshold: i64,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Repository for runtime settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets the current settings.
    ///
    /// The migration seeds the row, so `NotFound` here means the schema
    /// was tampered with.
    pub async fn get(&self) -> DbResult<Settings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT vat_rate, low_stock_threshold, updated_at FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Settings", "1"))?;

        let vat_rate = Decimal::from_str(&row.vat_rate).map_err(|e| {
            DbError::corrupt("Settings", format!("vat_rate '{}': {}", row.vat_rate, e))
        })?;

        Ok(Settings {
            vat_rate,
            low_stock_threshold: row.low_stock_threshold,
            updated_at: row.updated_at,
        })
    }

    /// Updates the settings row.
    pub async fn update(&self, vat_rate: Decimal, low_stock_threshold: i64) -> DbResult<()> {
        debug!(vat_rate = %vat_rate, low_stock_threshold = %low_stock_threshold, "Updating settings");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE settings SET
                vat_rate = ?1,
                low_stock_threshold = ?2,
                updated_at = ?3
            WHERE id = 1
            "#,
        )
        .bind(vat_rate.to_string())
        .bind(low_stock_threshold)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Settings", "1"));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
