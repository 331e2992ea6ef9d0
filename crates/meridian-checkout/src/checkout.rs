//! # Checkout Orchestrator
//!
//! The `Draft → Paid` transition as one logical unit of work.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(cart_id, caller_id)                                           │
//! │                                                                         │
//! │  1. Load cart ──────────────── NotFound if missing                      │
//! │  2. Enforce guards ─────────── Draft, non-empty, customer set,          │
//! │                                caller == cashier                        │
//! │  3. Recompute totals ───────── fresh VAT rate; the authoritative        │
//! │                                snapshot (never the cached fields)       │
//! │  4. BEGIN TRANSACTION                                                   │
//! │     a. decrement stock per line item                                    │
//! │     b. debit redeemed points (exactly once, account required)           │
//! │     c. persist cart as Paid with the recomputed totals                  │
//! │     COMMIT ─────────────────── any failure rolls back a, b and c        │
//! │  5. Return receipt                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no retries and no partial success: an error from any step
//! propagates unchanged and leaves stock, ledger and cart untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::settings::SettingsCache;
use meridian_core::{compute_totals, CoreError, Item, Totals};
use meridian_db::{Database, DbError};

/// Acknowledgement returned by a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub cart_id: String,
    pub cashier_id: String,
    pub customer_id: String,
    pub totals: Totals,
    pub points_redeemed: i64,
    pub paid_at: DateTime<Utc>,
}

/// Service for the checkout transition.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    settings: Arc<SettingsCache>,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database, settings: Arc<SettingsCache>) -> Self {
        CheckoutService { db, settings }
    }

    /// Checks out a Draft cart on behalf of `caller_id`.
    ///
    /// ## Errors
    /// * `NotFound` - cart missing, an item row missing at decrement
    ///   time, or points redeemed against a missing ledger account
    /// * `InvalidState` - cart is not Draft (also raised when a
    ///   concurrent checkout wins the status-guarded update)
    /// * `Unauthorized` - caller is not the cart's cashier
    /// * `EmptyCart` / `MissingCustomer` - guard failures
    pub async fn checkout(&self, cart_id: &str, caller_id: &str) -> EngineResult<CheckoutReceipt> {
        debug!(cart_id = %cart_id, caller_id = %caller_id, "checkout");

        let mut cart = self
            .db
            .carts()
            .get_by_id(cart_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Cart", cart_id))?;

        cart.ensure_checkout_allowed(caller_id)?;
        let customer_id = cart
            .customer_id
            .clone()
            .ok_or(CoreError::MissingCustomer)?;

        // The authoritative snapshot: recomputed with a fresh VAT rate so
        // a stale cached total is never charged.
        let vat_rate = self.settings.vat_rate().await?;
        let totals = compute_totals(
            &cart.items,
            &cart.discounts,
            cart.points_redeemed,
            vat_rate,
        )?;

        let paid_at = Utc::now();
        let items = self.db.items();
        let loyalty = self.db.loyalty();
        let carts = self.db.carts();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        for line in &cart.items {
            items
                .decrement_stock(&mut tx, &line.item_id, line.quantity)
                .await?;
        }

        if cart.points_redeemed > 0 {
            loyalty
                .adjust(&mut tx, &customer_id, -cart.points_redeemed)
                .await?;
        }

        cart.mark_paid(totals, paid_at)?;
        carts.mark_paid(&mut tx, &cart).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            cart_id = %cart.id,
            cashier_id = %cart.cashier_id,
            grand_total = %totals.grand_total,
            points_redeemed = %cart.points_redeemed,
            "Checkout complete"
        );

        Ok(CheckoutReceipt {
            cart_id: cart.id,
            cashier_id: cart.cashier_id,
            customer_id,
            totals,
            points_redeemed: cart.points_redeemed,
            paid_at,
        })
    }

    /// Lists items at or below the configured low-stock threshold.
    ///
    /// Checkout decrements are what drive items onto this report; the
    /// threshold comes from settings through the cache.
    pub async fn low_stock_report(&self) -> EngineResult<Vec<Item>> {
        let threshold = self.settings.low_stock_threshold().await?;
        Ok(self.db.items().low_stock(threshold).await?)
    }
}
