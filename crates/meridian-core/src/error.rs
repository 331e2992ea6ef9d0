//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meridian-core errors (this file)                                       │
//! │  ├── CoreError        - Guard and pricing failures                      │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  meridian-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  meridian-checkout errors (separate crate)                              │
//! │  └── EngineError      - Unifies the above at the service boundary       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (cart id, discount id, etc.)
//! 3. Errors are enum variants, never String
//! 4. No local recovery: every error propagates to the immediate caller

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart state machine and the
/// pricing engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart is not in a status that allows the requested operation.
    ///
    /// Raised for every mutation attempted outside `Draft`, and for a
    /// checkout attempted on a cart that is already `Paid` or `Confirmed`.
    #[error("cart is {status}, cannot {operation}")]
    InvalidState { operation: String, status: String },

    /// The caller performing checkout is not the cart's cashier.
    #[error("caller {caller_id} is not cashier {cashier_id} for this cart")]
    Unauthorized {
        cashier_id: String,
        caller_id: String,
    },

    /// A line item has a non-positive quantity or a negative unit price.
    #[error("invalid line item: {reason}")]
    InvalidLineItem { reason: String },

    /// The discount is already applied to this cart.
    #[error("discount {discount_id} is already applied")]
    DuplicateDiscount { discount_id: String },

    /// The discount is outside its validity window at application time.
    #[error("discount {discount_id} is not valid at {at}")]
    DiscountNotApplicable { discount_id: String, at: String },

    /// Redeeming more points than the customer's ledger balance.
    #[error("insufficient loyalty points: requested {requested}, balance {balance}")]
    InsufficientLoyaltyPoints { requested: i64, balance: i64 },

    /// Checkout requires at least one line item.
    #[error("cart has no items")]
    EmptyCart,

    /// Checkout requires a customer reference on the cart.
    #[error("cart has no customer")]
    MissingCustomer,

    /// The referenced line item is not in the cart.
    #[error("item {item_id} not in cart")]
    LineItemNotFound { item_id: String },

    /// The referenced discount is not applied to the cart.
    #[error("discount {discount_id} not applied to cart")]
    DiscountNotFound { discount_id: String },

    /// Cart has exceeded maximum allowed distinct line items.
    #[error("cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A monetary intermediate exceeded the representable range.
    #[error("amount out of range while computing {context}")]
    AmountOverflow { context: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error for a named operation.
    pub fn invalid_state(operation: impl Into<String>, status: impl Into<String>) -> Self {
        CoreError::InvalidState {
            operation: operation.into(),
            status: status.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs, when a value does not meet basic
/// requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., bad characters in a SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::invalid_state("apply discount", "paid");
        assert_eq!(err.to_string(), "cart is paid, cannot apply discount");

        let err = CoreError::InsufficientLoyaltyPoints {
            requested: 5000,
            balance: 1200,
        };
        assert_eq!(
            err.to_string(),
            "insufficient loyalty points: requested 5000, balance 1200"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "cashier_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
