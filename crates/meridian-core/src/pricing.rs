//! # Pricing Engine
//!
//! The pure totals computation for a cart: item totals, sequential
//! discount stacking, loyalty point redemption, VAT, grand total.
//!
//! ## Computation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       compute_totals                                    │
//! │                                                                         │
//! │  line items ──► items_total = Σ unit_price × quantity   (exact i64)     │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  discounts  ──► remaining: Decimal, discounts applied IN ORDER          │
//! │                  percentage: remaining -= remaining × value/100         │
//! │                  fixed:      remaining -= value × 100 (cents)           │
//! │                  (no per-step floor; remaining may go negative)         │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  points     ──► points_discount = points / 1000 currency units          │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  discount_total = clamp(items_total − remaining + points_discount,      │
//! │                         0, items_total), rounded half-up                │
//! │  vat_amount     = (items_total − discount_total) × vat_rate, half-up    │
//! │  grand_total    = items_total − discount_total + vat_amount  (exact)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are always recomputed whole from the cart's current contents,
//! never patched incrementally. Intermediates stay in `Decimal`; rounding
//! happens once, at the output boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::LineItem;
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, VatRate};
use crate::types::{AppliedDiscount, DiscountKind};
use crate::POINTS_PER_CURRENCY_UNIT;

// =============================================================================
// Totals
// =============================================================================

/// The four derived amounts cached on a cart.
///
/// Invariant: `grand_total == items_total - discount_total + vat_amount`
/// holds exactly in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of all line totals before discounts and VAT.
    pub items_total: Money,

    /// Catalog discounts plus redeemed points, clamped to
    /// `[0, items_total]`.
    pub discount_total: Money,

    /// VAT on the post-discount base.
    pub vat_amount: Money,

    /// The final amount charged.
    pub grand_total: Money,
}

// =============================================================================
// compute_totals
// =============================================================================

/// Computes cart totals from line items, applied discounts and redeemed
/// points.
///
/// Pure function: no side effects, no I/O, deterministic for identical
/// inputs. The VAT rate is passed in by the caller; the engine never
/// reaches out to settings itself.
///
/// ## Arguments
/// * `items` - the cart's line items (insertion order irrelevant to totals)
/// * `discounts` - applied discounts, stacked strictly in list order
/// * `points_redeemed` - loyalty points consumed against this cart
/// * `vat_rate` - current VAT rate, sourced from settings at call time
///
/// ## Errors
/// * `InvalidLineItem` - any quantity <= 0 or unit price < 0
/// * `Validation` - negative `points_redeemed`
/// * `AmountOverflow` - an intermediate exceeded i64 cents
pub fn compute_totals(
    items: &[LineItem],
    discounts: &[AppliedDiscount],
    points_redeemed: i64,
    vat_rate: VatRate,
) -> CoreResult<Totals> {
    if points_redeemed < 0 {
        return Err(crate::error::ValidationError::MustBeNonNegative {
            field: "points_redeemed".to_string(),
        }
        .into());
    }

    // Step 1: items total, exact integer arithmetic.
    let mut items_total: i64 = 0;
    for line in items {
        if line.quantity <= 0 {
            return Err(CoreError::InvalidLineItem {
                reason: format!("quantity {} for item {}", line.quantity, line.item_id),
            });
        }
        if line.unit_price_cents < 0 {
            return Err(CoreError::InvalidLineItem {
                reason: format!(
                    "unit price {} for item {}",
                    line.unit_price_cents, line.item_id
                ),
            });
        }
        let line_total = line
            .unit_price_cents
            .checked_mul(line.quantity)
            .ok_or(CoreError::AmountOverflow {
                context: "line total",
            })?;
        items_total = items_total
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow {
                context: "items total",
            })?;
    }
    let items_total_dec = Decimal::from(items_total);

    // Step 2: sequential discount stacking in application order.
    // The running total deliberately has no per-step floor; a dominant
    // fixed discount may drive it negative before the final clamp.
    let hundred = Decimal::ONE_HUNDRED;
    let mut remaining = items_total_dec;
    for discount in discounts {
        match discount.kind {
            DiscountKind::Percentage => {
                remaining -= remaining * discount.value / hundred;
            }
            DiscountKind::Fixed => {
                // value is in currency units; remaining is in cents
                remaining -= discount.value * hundred;
            }
        }
    }

    // Step 3: loyalty points, 1000 points = 1 currency unit = 100 cents.
    let points_discount =
        Decimal::from(points_redeemed) * hundred / Decimal::from(POINTS_PER_CURRENCY_UNIT);

    // Step 4: discount total, clamped into [0, items_total].
    let mut discount_total_dec = items_total_dec - remaining + points_discount;
    if discount_total_dec < Decimal::ZERO {
        discount_total_dec = Decimal::ZERO;
    } else if discount_total_dec > items_total_dec {
        discount_total_dec = items_total_dec;
    }
    let discount_total =
        Money::from_decimal_cents(discount_total_dec).ok_or(CoreError::AmountOverflow {
            context: "discount total",
        })?;

    // Step 5: VAT on the post-discount base.
    let taxable = Decimal::from(items_total - discount_total.cents());
    let vat_amount = Money::from_decimal_cents(taxable * vat_rate.as_decimal()).ok_or(
        CoreError::AmountOverflow {
            context: "vat amount",
        },
    )?;

    // Step 6: grand total; the identity holds exactly in cents.
    let items_total = Money::from_cents(items_total);
    let grand_total = items_total - discount_total + vat_amount;

    Ok(Totals {
        items_total,
        discount_total,
        vat_amount,
        grand_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
