//! # Cart Aggregate & State Machine
//!
//! The central aggregate of the checkout engine: a cart owns its line
//! items, its ordered applied discounts and its point redemption, and
//! guards every mutation behind its lifecycle status.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Lifecycle                                   │
//! │                                                                         │
//! │   ┌─────────┐   checkout    ┌────────┐   reconciliation   ┌───────────┐ │
//! │   │  Draft  │──────────────►│  Paid  │───────────────────►│ Confirmed │ │
//! │   └─────────┘               └────────┘  (external, out    └───────────┘ │
//! │        │                                 of engine scope)               │
//! │        │ add_item / update_quantity / remove_item                       │
//! │        │ set_customer / apply_discount / remove_discount                │
//! │        │ redeem_points                                                  │
//! │        ▼                                                                │
//! │   totals recomputed on EVERY mutation via the pricing engine            │
//! │                                                                         │
//! │   No transition skips a state. No backward transitions.                 │
//! │   Paid and Confirmed carts are read-only.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, VatRate};
use crate::pricing::{compute_totals, Totals};
use crate::types::{AppliedDiscount, Discount, Item};
use crate::validation::{validate_points, validate_quantity};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Cart Status
// =============================================================================

/// The lifecycle status of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Cart is being built; the only mutable state.
    Draft,
    /// Checkout completed; inventory and loyalty side effects have fired.
    Paid,
    /// Reconciled by an external process; terminal and read-only.
    Confirmed,
}

impl Default for CartStatus {
    fn default() -> Self {
        CartStatus::Draft
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CartStatus::Draft => "draft",
            CartStatus::Paid => "paid",
            CartStatus::Confirmed => "confirmed",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One item-quantity pairing within a cart.
///
/// Uses the snapshot pattern: sku, name and unit price are frozen at the
/// moment the item is added, so catalog edits do not ripple into open
/// carts. `line_total_cents` is recomputed from the frozen unit price on
/// every quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    /// Inventory item this line refers to.
    pub item_id: String,

    /// SKU at time of adding (frozen).
    pub sku: String,

    /// Item name at time of adding (frozen).
    pub name: String,

    /// Unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity in cart.
    pub quantity: i64,

    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
}

impl LineItem {
    /// Creates a line item from an inventory item, freezing its price.
    pub fn from_item(item: &Item, quantity: i64) -> Self {
        LineItem {
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            unit_price_cents: item.price_cents,
            quantity,
            line_total_cents: item.price_cents * quantity,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.line_total_cents = self.unit_price_cents * quantity;
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart aggregate.
///
/// ## Invariants (after every mutation)
/// - cached totals equal a fresh `compute_totals` over the current
///   contents
/// - applied discounts are unique by discount id and strictly ordered
/// - `points_redeemed >= 0`
/// - at most [`MAX_CART_ITEMS`] distinct line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,

    /// Cashier who owns this cart; only this caller may check it out.
    pub cashier_id: String,

    /// Customer the sale is for; optional while Draft, required at
    /// checkout.
    pub customer_id: Option<String>,

    pub status: CartStatus,

    /// Line items in display order.
    pub items: Vec<LineItem>,

    /// Applied discounts in application order (stacking order).
    pub discounts: Vec<AppliedDiscount>,

    /// Loyalty points consumed against this cart. The ledger is debited
    /// only at checkout.
    pub points_redeemed: i64,

    // Derived fields, recomputed on every mutation.
    pub items_total_cents: i64,
    pub discount_total_cents: i64,
    pub vat_amount_cents: i64,
    pub grand_total_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Creates a new empty Draft cart owned by a cashier.
    pub fn new(id: impl Into<String>, cashier_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            id: id.into(),
            cashier_id: cashier_id.into(),
            customer_id: None,
            status: CartStatus::Draft,
            items: Vec::new(),
            discounts: Vec::new(),
            points_redeemed: 0,
            items_total_cents: 0,
            discount_total_cents: 0,
            vat_amount_cents: 0,
            grand_total_cents: 0,
            created_at: now,
            updated_at: now,
            paid_at: None,
        }
    }

    /// Returns the cached totals as a `Totals` value.
    pub fn totals(&self) -> Totals {
        Totals {
            items_total: Money::from_cents(self.items_total_cents),
            discount_total: Money::from_cents(self.discount_total_cents),
            vat_amount: Money::from_cents(self.vat_amount_cents),
            grand_total: Money::from_cents(self.grand_total_cents),
        }
    }

    /// Checks if the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn ensure_draft(&self, operation: &str) -> CoreResult<()> {
        if self.status != CartStatus::Draft {
            return Err(CoreError::invalid_state(operation, self.status.to_string()));
        }
        Ok(())
    }

    /// Recomputes and caches totals from the current contents.
    ///
    /// Called by every mutation; callable directly to refresh totals
    /// against a new VAT rate (checkout does this for its authoritative
    /// snapshot).
    pub fn recompute_totals(&mut self, vat_rate: VatRate) -> CoreResult<()> {
        let totals = compute_totals(&self.items, &self.discounts, self.points_redeemed, vat_rate)?;
        self.items_total_cents = totals.items_total.cents();
        self.discount_total_cents = totals.discount_total.cents();
        self.vat_amount_cents = totals.vat_amount.cents();
        self.grand_total_cents = totals.grand_total.cents();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Draft mutations
    // -------------------------------------------------------------------------

    /// Sets the customer the sale is for.
    pub fn set_customer(&mut self, customer_id: impl Into<String>) -> CoreResult<()> {
        self.ensure_draft("set customer")?;
        let customer_id = customer_id.into();
        if customer_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer_id".to_string(),
            }
            .into());
        }
        self.customer_id = Some(customer_id);
        self.touch();
        Ok(())
    }

    /// Adds an inventory item to the cart, freezing its current price.
    ///
    /// If the item is already in the cart its quantity increases instead;
    /// the original price snapshot is kept.
    pub fn add_item(&mut self, item: &Item, quantity: i64, vat_rate: VatRate) -> CoreResult<()> {
        self.ensure_draft("add item")?;
        validate_quantity(quantity)?;

        if let Some(line) = self.items.iter_mut().find(|l| l.item_id == item.id) {
            let merged = line.quantity + quantity;
            validate_quantity(merged)?;
            line.set_quantity(merged);
        } else {
            if self.items.len() >= MAX_CART_ITEMS {
                return Err(CoreError::CartTooLarge {
                    max: MAX_CART_ITEMS,
                });
            }
            self.items.push(LineItem::from_item(item, quantity));
        }

        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    /// Sets the quantity of a line item; quantity 0 removes the line.
    pub fn update_quantity(
        &mut self,
        item_id: &str,
        quantity: i64,
        vat_rate: VatRate,
    ) -> CoreResult<()> {
        self.ensure_draft("update quantity")?;

        if quantity == 0 {
            return self.remove_item(item_id, vat_rate);
        }
        validate_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::LineItemNotFound {
                item_id: item_id.to_string(),
            })?;
        line.set_quantity(quantity);

        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    /// Removes a line item from the cart.
    pub fn remove_item(&mut self, item_id: &str, vat_rate: VatRate) -> CoreResult<()> {
        self.ensure_draft("remove item")?;

        let initial_len = self.items.len();
        self.items.retain(|l| l.item_id != item_id);
        if self.items.len() == initial_len {
            return Err(CoreError::LineItemNotFound {
                item_id: item_id.to_string(),
            });
        }

        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    /// Removes all line items.
    pub fn clear_items(&mut self, vat_rate: VatRate) -> CoreResult<()> {
        self.ensure_draft("clear items")?;
        self.items.clear();
        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    /// Applies a catalog discount, snapshotting kind and value.
    ///
    /// The discount lands at the end of the ordered list; stacking follows
    /// application order. Validity is checked against `at` now, not again
    /// at checkout.
    pub fn apply_discount(
        &mut self,
        discount: &Discount,
        at: DateTime<Utc>,
        vat_rate: VatRate,
    ) -> CoreResult<()> {
        self.ensure_draft("apply discount")?;

        if self.discounts.iter().any(|d| d.discount_id == discount.id) {
            return Err(CoreError::DuplicateDiscount {
                discount_id: discount.id.clone(),
            });
        }
        if !discount.is_valid_at(at) {
            return Err(CoreError::DiscountNotApplicable {
                discount_id: discount.id.clone(),
                at: at.to_rfc3339(),
            });
        }

        self.discounts.push(AppliedDiscount::from_discount(discount));
        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    /// Removes an applied discount; remaining discounts keep their order.
    pub fn remove_discount(&mut self, discount_id: &str, vat_rate: VatRate) -> CoreResult<()> {
        self.ensure_draft("remove discount")?;

        let initial_len = self.discounts.len();
        self.discounts.retain(|d| d.discount_id != discount_id);
        if self.discounts.len() == initial_len {
            return Err(CoreError::DiscountNotFound {
                discount_id: discount_id.to_string(),
            });
        }

        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    /// Sets the points to redeem against this cart.
    ///
    /// `balance` is the customer's current ledger balance; the ledger is
    /// not debited here, only at checkout. Calling again replaces the
    /// previous redemption amount.
    pub fn redeem_points(&mut self, points: i64, balance: i64, vat_rate: VatRate) -> CoreResult<()> {
        self.ensure_draft("redeem points")?;

        validate_points(points)?;
        if points > balance {
            return Err(CoreError::InsufficientLoyaltyPoints {
                requested: points,
                balance,
            });
        }

        self.points_redeemed = points;
        self.recompute_totals(vat_rate)?;
        self.touch();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Checkout transition
    // -------------------------------------------------------------------------

    /// Enforces every checkout guard without mutating the cart.
    ///
    /// ## Guards
    /// - status is `Draft` (`InvalidState`)
    /// - at least one line item (`EmptyCart`)
    /// - customer reference set (`MissingCustomer`)
    /// - `caller_id` equals the cart's cashier (`Unauthorized`)
    pub fn ensure_checkout_allowed(&self, caller_id: &str) -> CoreResult<()> {
        self.ensure_draft("checkout")?;
        if self.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if self.customer_id.is_none() {
            return Err(CoreError::MissingCustomer);
        }
        if caller_id != self.cashier_id {
            return Err(CoreError::Unauthorized {
                cashier_id: self.cashier_id.clone(),
                caller_id: caller_id.to_string(),
            });
        }
        Ok(())
    }

    /// Transitions `Draft → Paid`, caching the authoritative totals.
    ///
    /// The caller (checkout orchestrator) has already enforced the guards
    /// and recomputed `totals` with a fresh VAT rate.
    pub fn mark_paid(&mut self, totals: Totals, paid_at: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_draft("mark paid")?;
        self.items_total_cents = totals.items_total.cents();
        self.discount_total_cents = totals.discount_total.cents();
        self.vat_amount_cents = totals.vat_amount.cents();
        self.grand_total_cents = totals.grand_total.cents();
        self.status = CartStatus::Paid;
        self.paid_at = Some(paid_at);
        self.updated_at = paid_at;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountKind;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn test_item(id: &str, price_cents: i64) -> Item {
        let now = Utc::now();
        Item {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Item {}", id),
            price_cents,
            stock: 100,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_discount(id: &str, kind: DiscountKind, value: i64) -> Discount {
        let now = Utc::now();
        Discount {
            id: id.to_string(),
            name: format!("Discount {}", id),
            kind,
            value: Decimal::from(value),
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            created_at: now,
        }
    }

    fn vat() -> VatRate {
        VatRate::from_percent(15)
    }

    #[test]
    fn test_new_cart_is_empty_draft() {
        let cart = Cart::new("c1", "cashier-1");
        assert_eq!(cart.status, CartStatus::Draft);
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total_cents, 0);
    }

    #[test]
    fn test_add_item_recomputes_totals() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 1000), 2, vat()).unwrap();

        assert_eq!(cart.items_total_cents, 2000);
        assert_eq!(cart.vat_amount_cents, 300);
        assert_eq!(cart.grand_total_cents, 2300);
    }

    #[test]
    fn test_add_same_item_merges_quantity_and_keeps_snapshot() {
        let mut cart = Cart::new("c1", "cashier-1");
        let mut item = test_item("a", 1000);
        cart.add_item(&item, 2, vat()).unwrap();

        // Catalog price change between adds; snapshot wins
        item.price_cents = 9999;
        cart.add_item(&item, 3, vat()).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].unit_price_cents, 1000);
        assert_eq!(cart.items_total_cents, 5000);
    }

    #[test]
    fn test_remove_and_readd_is_idempotent() {
        let mut cart = Cart::new("c1", "cashier-1");
        let item_a = test_item("a", 1000);
        let item_b = test_item("b", 250);
        cart.add_item(&item_a, 2, vat()).unwrap();
        cart.add_item(&item_b, 4, vat()).unwrap();
        let before = cart.totals();

        cart.remove_item("a", vat()).unwrap();
        cart.add_item(&item_a, 2, vat()).unwrap();

        assert_eq!(cart.totals(), before);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 1000), 2, vat()).unwrap();
        cart.update_quantity("a", 0, vat()).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total_cents, 0);
    }

    #[test]
    fn test_clear_items_zeroes_totals() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 1000), 2, vat()).unwrap();
        cart.add_item(&test_item("b", 500), 1, vat()).unwrap();

        cart.clear_items(vat()).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total_cents, 0);
    }

    #[test]
    fn test_unknown_line_rejected() {
        let mut cart = Cart::new("c1", "cashier-1");
        assert!(matches!(
            cart.update_quantity("ghost", 2, vat()),
            Err(CoreError::LineItemNotFound { .. })
        ));
        assert!(matches!(
            cart.remove_item("ghost", vat()),
            Err(CoreError::LineItemNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_discount_rejected() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 10000), 1, vat()).unwrap();

        let discount = test_discount("d1", DiscountKind::Percentage, 10);
        let now = Utc::now();
        cart.apply_discount(&discount, now, vat()).unwrap();

        assert!(matches!(
            cart.apply_discount(&discount, now, vat()),
            Err(CoreError::DuplicateDiscount { .. })
        ));

        // Removing a discount that was never applied is its own error
        assert!(matches!(
            cart.remove_discount("ghost", vat()),
            Err(CoreError::DiscountNotFound { .. })
        ));
    }

    #[test]
    fn test_expired_discount_rejected() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 10000), 1, vat()).unwrap();

        let discount = test_discount("d1", DiscountKind::Percentage, 10);
        let after_window = Utc::now() + Duration::days(2);

        assert!(matches!(
            cart.apply_discount(&discount, after_window, vat()),
            Err(CoreError::DiscountNotApplicable { .. })
        ));
        assert!(cart.discounts.is_empty());
    }

    #[test]
    fn test_discounts_stack_in_application_order() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 10000), 1, vat()).unwrap();
        let now = Utc::now();

        cart.apply_discount(&test_discount("p10", DiscountKind::Percentage, 10), now, vat())
            .unwrap();
        cart.apply_discount(&test_discount("f5", DiscountKind::Fixed, 5), now, vat())
            .unwrap();

        // 100 × 0.9 − 5 = 85 → discount 15
        assert_eq!(cart.discount_total_cents, 1500);

        // Removing the first and re-applying it moves it to the END of the
        // stacking order: (100 − 5) × 0.9 = 85.5 → discount 14.50
        cart.remove_discount("p10", vat()).unwrap();
        cart.apply_discount(&test_discount("p10", DiscountKind::Percentage, 10), now, vat())
            .unwrap();
        assert_eq!(cart.discount_total_cents, 1450);
    }

    #[test]
    fn test_redeem_points_bounds() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 10000), 1, vat()).unwrap();

        // More than balance fails
        assert!(matches!(
            cart.redeem_points(5001, 5000, vat()),
            Err(CoreError::InsufficientLoyaltyPoints { .. })
        ));
        assert_eq!(cart.points_redeemed, 0);

        // Exactly the balance succeeds: 5000 points = $5.00
        cart.redeem_points(5000, 5000, vat()).unwrap();
        assert_eq!(cart.points_redeemed, 5000);
        assert_eq!(cart.discount_total_cents, 500);
    }

    #[test]
    fn test_mutations_rejected_outside_draft() {
        let mut cart = Cart::new("c1", "cashier-1");
        let item = test_item("a", 1000);
        cart.add_item(&item, 1, vat()).unwrap();
        cart.set_customer("cust-1").unwrap();
        let totals = cart.totals();
        cart.mark_paid(totals, Utc::now()).unwrap();

        assert!(matches!(
            cart.add_item(&item, 1, vat()),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(matches!(
            cart.set_customer("cust-2"),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(matches!(
            cart.redeem_points(0, 0, vat()),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(matches!(
            cart.apply_discount(
                &test_discount("d1", DiscountKind::Fixed, 5),
                Utc::now(),
                vat()
            ),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_checkout_guards() {
        let mut cart = Cart::new("c1", "cashier-1");

        // Empty cart
        assert!(matches!(
            cart.ensure_checkout_allowed("cashier-1"),
            Err(CoreError::EmptyCart)
        ));

        cart.add_item(&test_item("a", 1000), 1, vat()).unwrap();

        // No customer
        assert!(matches!(
            cart.ensure_checkout_allowed("cashier-1"),
            Err(CoreError::MissingCustomer)
        ));

        cart.set_customer("cust-1").unwrap();

        // Wrong caller
        assert!(matches!(
            cart.ensure_checkout_allowed("cashier-2"),
            Err(CoreError::Unauthorized { .. })
        ));

        // All guards pass
        cart.ensure_checkout_allowed("cashier-1").unwrap();

        // Already paid
        let totals = cart.totals();
        cart.mark_paid(totals, Utc::now()).unwrap();
        assert!(matches!(
            cart.ensure_checkout_allowed("cashier-1"),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_mark_paid_only_from_draft() {
        let mut cart = Cart::new("c1", "cashier-1");
        cart.add_item(&test_item("a", 1000), 1, vat()).unwrap();
        let totals = cart.totals();

        cart.mark_paid(totals, Utc::now()).unwrap();
        assert_eq!(cart.status, CartStatus::Paid);
        assert!(cart.paid_at.is_some());

        // Double transition fails
        assert!(matches!(
            cart.mark_paid(totals, Utc::now()),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_cart_item_cap() {
        let mut cart = Cart::new("c1", "cashier-1");
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_item(&format!("i{}", i), 100), 1, vat())
                .unwrap();
        }
        assert!(matches!(
            cart.add_item(&test_item("overflow", 100), 1, vat()),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new("c1", "cashier-1");
        assert!(cart.add_item(&test_item("a", 100), 1000, vat()).is_err());

        cart.add_item(&test_item("a", 100), 999, vat()).unwrap();
        // Merging past the cap also fails
        assert!(cart.add_item(&test_item("a", 100), 1, vat()).is_err());
    }
}
