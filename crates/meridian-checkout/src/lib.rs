//! # meridian-checkout: Cart & Checkout Services
//!
//! The orchestration layer of Meridian POS. Guards and pricing math live
//! in `meridian-core`; SQL lives in `meridian-db`; this crate wires them
//! together into the operations a POS front end would call.
//!
//! ## Services
//!
//! - [`SettingsCache`] - injected, invalidatable cache over persisted
//!   settings (VAT rate, low-stock threshold)
//! - [`CartService`] - Draft-cart mutations, persisted immediately with
//!   freshly recomputed totals
//! - [`CheckoutService`] - the transactional `Draft → Paid` transition
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meridian_checkout::{CartService, CheckoutService, SettingsCache};
//! use meridian_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./meridian.db")).await?;
//! let settings = Arc::new(SettingsCache::new(db.settings()));
//! let carts = CartService::new(db.clone(), settings.clone());
//! let checkout = CheckoutService::new(db, settings);
//!
//! let cart = carts.create_cart("cashier-7").await?;
//! carts.set_customer(&cart.id, "cust-42").await?;
//! carts.add_item(&cart.id, &item_id, 2).await?;
//! let receipt = checkout.checkout(&cart.id, "cashier-7").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart_service;
pub mod checkout;
pub mod error;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart_service::CartService;
pub use checkout::{CheckoutReceipt, CheckoutService};
pub use error::{EngineError, EngineResult};
pub use settings::SettingsCache;
