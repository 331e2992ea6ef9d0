//! # Cart Service
//!
//! Draft-cart operations: create the cart, attach a customer, manage line
//! items, apply discounts, set a point redemption.
//!
//! Every operation follows the same shape: load the aggregate, apply the
//! core mutation (which enforces the Draft guard and recomputes totals
//! with the cached VAT rate), persist immediately. The loyalty ledger is
//! only *read* here; the debit belongs to checkout.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::settings::SettingsCache;
use meridian_core::{Cart, CoreError, ValidationError};
use meridian_db::Database;

/// Service for building Draft carts.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
    settings: Arc<SettingsCache>,
}

impl CartService {
    /// Creates a new CartService.
    pub fn new(db: Database, settings: Arc<SettingsCache>) -> Self {
        CartService { db, settings }
    }

    /// Creates a new empty Draft cart owned by a cashier.
    pub async fn create_cart(&self, cashier_id: &str) -> EngineResult<Cart> {
        if cashier_id.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "cashier_id".to_string(),
            })
            .into());
        }

        let cart = Cart::new(Uuid::new_v4().to_string(), cashier_id);
        self.db.carts().insert(&cart).await?;

        info!(cart_id = %cart.id, cashier_id = %cashier_id, "Cart created");
        Ok(cart)
    }

    /// Loads a cart in any status (read-only view).
    pub async fn get_cart(&self, cart_id: &str) -> EngineResult<Cart> {
        self.db
            .carts()
            .get_by_id(cart_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Cart", cart_id))
    }

    /// Sets the customer the sale is for.
    pub async fn set_customer(&self, cart_id: &str, customer_id: &str) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, customer_id = %customer_id, "set_customer");

        let mut cart = self.get_cart(cart_id).await?;
        cart.set_customer(customer_id)?;
        self.db.carts().update_draft(&cart).await?;
        Ok(cart)
    }

    /// Adds an item to the cart, snapshotting its current catalog price.
    ///
    /// Adding an item that is already in the cart increases its quantity;
    /// the original price snapshot is kept.
    pub async fn add_item(&self, cart_id: &str, item_id: &str, quantity: i64) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, item_id = %item_id, quantity = %quantity, "add_item");

        let mut cart = self.get_cart(cart_id).await?;
        let item = self
            .db
            .items()
            .get_by_id(item_id)
            .await?
            .filter(|i| i.is_active)
            .ok_or_else(|| EngineError::not_found("Item", item_id))?;

        let vat_rate = self.settings.vat_rate().await?;
        cart.add_item(&item, quantity, vat_rate)?;
        self.db.carts().update_draft(&cart).await?;
        Ok(cart)
    }

    /// Sets the quantity of a line item; quantity 0 removes the line.
    pub async fn update_quantity(
        &self,
        cart_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, item_id = %item_id, quantity = %quantity, "update_quantity");

        let mut cart = self.get_cart(cart_id).await?;
        let vat_rate = self.settings.vat_rate().await?;
        cart.update_quantity(item_id, quantity, vat_rate)?;
        self.db.carts().update_draft(&cart).await?;
        Ok(cart)
    }

    /// Removes a line item from the cart.
    pub async fn remove_item(&self, cart_id: &str, item_id: &str) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, item_id = %item_id, "remove_item");

        let mut cart = self.get_cart(cart_id).await?;
        let vat_rate = self.settings.vat_rate().await?;
        cart.remove_item(item_id, vat_rate)?;
        self.db.carts().update_draft(&cart).await?;
        Ok(cart)
    }

    /// Applies a catalog discount to the cart.
    ///
    /// The discount's validity window is checked now, against the current
    /// clock; it is not re-checked at checkout.
    pub async fn apply_discount(&self, cart_id: &str, discount_id: &str) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, discount_id = %discount_id, "apply_discount");

        let mut cart = self.get_cart(cart_id).await?;
        let discount = self
            .db
            .discounts()
            .get_by_id(discount_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Discount", discount_id))?;

        let vat_rate = self.settings.vat_rate().await?;
        cart.apply_discount(&discount, Utc::now(), vat_rate)?;
        self.db.carts().update_draft(&cart).await?;

        info!(cart_id = %cart_id, discount_id = %discount_id, "Discount applied");
        Ok(cart)
    }

    /// Removes an applied discount from the cart.
    pub async fn remove_discount(&self, cart_id: &str, discount_id: &str) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, discount_id = %discount_id, "remove_discount");

        let mut cart = self.get_cart(cart_id).await?;
        let vat_rate = self.settings.vat_rate().await?;
        cart.remove_discount(discount_id, vat_rate)?;
        self.db.carts().update_draft(&cart).await?;
        Ok(cart)
    }

    /// Sets the loyalty points to redeem against this cart.
    ///
    /// Validates against the customer's live ledger balance but does NOT
    /// debit it; the debit fires exactly once, at checkout. Redeeming a
    /// positive amount requires the customer to have a ledger account.
    pub async fn redeem_points(&self, cart_id: &str, points: i64) -> EngineResult<Cart> {
        debug!(cart_id = %cart_id, points = %points, "redeem_points");

        let mut cart = self.get_cart(cart_id).await?;
        let customer_id = cart
            .customer_id
            .clone()
            .ok_or(CoreError::MissingCustomer)?;

        let balance = match self.db.loyalty().get_balance(&customer_id).await? {
            Some(balance) => balance,
            // No account: clearing a redemption back to zero is allowed,
            // redeeming anything is not.
            None if points == 0 => 0,
            None => return Err(EngineError::not_found("LoyaltyAccount", customer_id.clone())),
        };

        let vat_rate = self.settings.vat_rate().await?;
        cart.redeem_points(points, balance, vat_rate)?;
        self.db.carts().update_draft(&cart).await?;

        info!(cart_id = %cart_id, points = %points, "Points redeemed against cart");
        Ok(cart)
    }
}
