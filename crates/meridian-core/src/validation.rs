//! # Validation Module
//!
//! Input validation for values entering the engine. Validators run before
//! business logic; the database's NOT NULL / CHECK constraints are the
//! last line of defense behind them.
//!
//! ## Usage
//! ```rust
//! use meridian_core::validation::{validate_quantity, validate_sku};
//!
//! validate_sku("COKE-330").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::DiscountKind;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - not empty, at most 50 characters
/// - alphanumeric, hyphens and underscores only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an item or discount display name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: strictly positive, bounded by
/// [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a unit price in cents: non-negative.
pub fn validate_unit_price(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "price_cents".to_string(),
        });
    }
    Ok(())
}

/// Validates a discount value for its kind.
///
/// ## Rules
/// - Percentage: strictly positive, at most 100
/// - Fixed: strictly positive
pub fn validate_discount_value(kind: DiscountKind, value: Decimal) -> ValidationResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "value".to_string(),
        });
    }
    if kind == DiscountKind::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "value".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates a loyalty point count: non-negative.
pub fn validate_points(points: i64) -> ValidationResult<()> {
    if points < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "points".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("sku_1").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_discount_value() {
        assert!(validate_discount_value(DiscountKind::Percentage, Decimal::from(10)).is_ok());
        assert!(validate_discount_value(DiscountKind::Percentage, Decimal::from(100)).is_ok());
        assert!(validate_discount_value(DiscountKind::Percentage, Decimal::from(101)).is_err());
        assert!(validate_discount_value(DiscountKind::Fixed, Decimal::from(5)).is_ok());
        assert!(validate_discount_value(DiscountKind::Fixed, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_validate_points() {
        assert!(validate_points(0).is_ok());
        assert!(validate_points(1000).is_ok());
        assert!(validate_points(-1).is_err());
    }
}
