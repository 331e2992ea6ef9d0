//! # Domain Types
//!
//! Core domain types used throughout Meridian POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │      Item       │   │    Discount     │   │ LoyaltyAccount  │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  customer_id    │        │
//! │  │  sku (business) │   │  kind           │   │  balance        │        │
//! │  │  price_cents    │   │  value          │   │                 │        │
//! │  │  stock          │   │  valid window   │   │                 │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  Cart / LineItem / CartStatus live in the `cart` module.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Entities have an immutable UUID `id` used for relations, and where it
//! exists a human-readable business id (sku) that may change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::Money;
use crate::validation;

// =============================================================================
// Inventory Item
// =============================================================================

/// An inventory item available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level. May go negative after checkout decrements.
    pub stock: i64,

    /// Whether item is active (soft delete).
    pub is_active: bool,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates a validated catalog item with a fresh UUID.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
        stock: i64,
    ) -> CoreResult<Self> {
        let sku = sku.into();
        let name = name.into();
        validation::validate_sku(&sku)?;
        validation::validate_name(&name)?;
        validation::validate_unit_price(price_cents)?;

        let now = Utc::now();
        Ok(Item {
            id: Uuid::new_v4().to_string(),
            sku,
            name,
            price_cents,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is percentage points off the running total (10 = 10%).
    Percentage,
    /// `value` is a fixed amount off in whole currency units (5 = $5.00).
    Fixed,
}

/// A discount definition from the catalog.
///
/// Validity (`valid_from <= now <= valid_to`) is checked when the discount
/// is applied to a cart; it is not re-checked at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: String,
    pub name: String,
    pub kind: DiscountKind,
    /// Percentage points or currency units, depending on `kind`.
    pub value: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Creates a validated discount definition with a fresh UUID.
    pub fn new(
        name: impl Into<String>,
        kind: DiscountKind,
        value: Decimal,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let name = name.into();
        validation::validate_name(&name)?;
        validation::validate_discount_value(kind, value)?;

        Ok(Discount {
            id: Uuid::new_v4().to_string(),
            name,
            kind,
            value,
            valid_from,
            valid_to,
            created_at: Utc::now(),
        })
    }

    /// Checks whether the discount's validity window covers `at`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && at <= self.valid_to
    }
}

/// A discount applied to a cart.
///
/// Uses the snapshot pattern: `kind` and `value` are frozen at application
/// time, so later administrative edits to the catalog row do not change
/// what an open cart charges. Applied discounts form an explicit ordered
/// list; stacking follows application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    /// Catalog discount this snapshot was taken from.
    pub discount_id: String,

    /// Name at time of application (frozen).
    pub name: String,

    /// Kind at time of application (frozen).
    pub kind: DiscountKind,

    /// Value at time of application (frozen).
    pub value: Decimal,
}

impl AppliedDiscount {
    /// Takes an application-time snapshot of a catalog discount.
    pub fn from_discount(discount: &Discount) -> Self {
        AppliedDiscount {
            discount_id: discount.id.clone(),
            name: discount.name.clone(),
            kind: discount.kind,
            value: discount.value,
        }
    }
}

// =============================================================================
// Loyalty Account
// =============================================================================

/// A customer's redeemable loyalty point balance.
///
/// 1000 points convert to 1 currency unit of discount (see
/// [`crate::POINTS_PER_CURRENCY_UNIT`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyAccount {
    pub customer_id: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Settings
// =============================================================================

/// Runtime settings persisted as a single row.
///
/// The VAT rate is read through the settings cache at every totals
/// computation; it is never stored on a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// VAT rate as a decimal fraction (0.15 = 15%).
    pub vat_rate: Decimal,

    /// Stock level at or below which an item appears in the low-stock
    /// report.
    pub low_stock_threshold: i64,

    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount_with_window(from_offset: i64, to_offset: i64) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d1".to_string(),
            name: "Test".to_string(),
            kind: DiscountKind::Percentage,
            value: Decimal::from(10),
            valid_from: now + Duration::days(from_offset),
            valid_to: now + Duration::days(to_offset),
            created_at: now,
        }
    }

    #[test]
    fn test_discount_validity_window() {
        let now = Utc::now();

        assert!(discount_with_window(-1, 1).is_valid_at(now));
        assert!(!discount_with_window(1, 2).is_valid_at(now));
        assert!(!discount_with_window(-2, -1).is_valid_at(now));
    }

    #[test]
    fn test_applied_discount_snapshot() {
        let mut discount = discount_with_window(-1, 1);
        let applied = AppliedDiscount::from_discount(&discount);

        // Later catalog edits do not change the snapshot
        discount.value = Decimal::from(50);
        assert_eq!(applied.value, Decimal::from(10));
        assert_eq!(applied.discount_id, discount.id);
    }

    #[test]
    fn test_discount_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DiscountKind::Percentage).unwrap(),
            "\"percentage\""
        );
        assert_eq!(
            serde_json::to_string(&DiscountKind::Fixed).unwrap(),
            "\"fixed\""
        );
    }

    #[test]
    fn test_item_price() {
        let now = Utc::now();
        let item = Item {
            id: "i1".to_string(),
            sku: "COKE-330".to_string(),
            name: "Coca-Cola 330ml".to_string(),
            price_cents: 299,
            stock: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(item.price(), Money::from_cents(299));
    }
}
