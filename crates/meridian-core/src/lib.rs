//! # meridian-core: Pure Business Logic for Meridian POS
//!
//! This crate is the heart of the checkout engine. It contains the pricing
//! math and the cart state machine as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Meridian POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 meridian-checkout (services)                    │    │
//! │  │    CartService ─── CheckoutService ─── SettingsCache            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ meridian-core (THIS CRATE) ★                    │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │   cart    │  │  pricing  │    │    │
//! │  │   │ Item      │  │  Money    │  │  Cart     │  │  totals   │    │    │
//! │  │   │ Discount  │  │  VatRate  │  │ LineItem  │  │  stacking │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                  meridian-db (Database Layer)                   │    │
//! │  │             SQLite queries, migrations, repositories            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Discount, LoyaltyAccount, Settings)
//! - [`money`] - Money and VatRate types (integer cents, exact decimals)
//! - [`cart`] - The Cart aggregate and its state machine
//! - [`pricing`] - The pure totals computation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; the VAT rate and the
//!    clock are inputs, never ambient state
//! 2. **No I/O**: database, network and file system access are forbidden
//!    here
//! 3. **Integer Money**: stored amounts are cents (i64); fractional
//!    intermediates run in `rust_decimal` and round half-up once, at the
//!    output boundary
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use meridian_core::Money` instead of
// `use meridian_core::money::Money`

pub use cart::{Cart, CartStatus, LineItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, VatRate};
pub use pricing::{compute_totals, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Loyalty point exchange rate: 1000 points = 1 currency unit of discount.
pub const POINTS_PER_CURRENCY_UNIT: i64 = 1000;

/// Maximum distinct line items allowed in a single cart.
///
/// Prevents runaway carts and keeps transaction sizes reasonable.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
