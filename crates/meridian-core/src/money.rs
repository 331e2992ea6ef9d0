//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! `VatRate` type for tax rates.
//!
//! ## Integer Money
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every stored amount is an integer count of minor units (cents).        │
//! │                                                                         │
//! │    $10.99  →  Money(1099)                                               │
//! │                                                                         │
//! │  Pricing intermediates that need fractions (percentage discounts,       │
//! │  VAT, point conversion) run in rust_decimal::Decimal and are rounded    │
//! │  half-up back into Money exactly once, at the output boundary.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use meridian_core::money::Money;
//!
//! // Create from cents (the only constructor)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                     // $21.98
//! let total = price + Money::from_cents(500);  // $15.99
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// - **i64 (signed)**: negative values are representable for refunds and
///   adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity, failing on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// let line_total = unit_price.multiply_quantity(3).unwrap();
    /// assert_eq!(line_total.cents(), 897); // $8.97
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Returns the value as an exact `Decimal` count of cents.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Rounds a `Decimal` count of cents half-up into a Money value.
    ///
    /// Half-up means a .5 fraction always rounds away from zero:
    /// 12.5 cents → 13 cents. Returns `None` when the value does not fit
    /// in i64 cents.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let cents = Decimal::new(125, 1); // 12.5
    /// assert_eq!(Money::from_decimal_cents(cents), Some(Money::from_cents(13)));
    /// ```
    pub fn from_decimal_cents(cents: Decimal) -> Option<Self> {
        cents
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }
}

// =============================================================================
// VAT Rate
// =============================================================================

/// A value-added tax rate as an exact decimal fraction.
///
/// `VatRate::from_percent(15)` is 15%, i.e. the fraction `0.15`.
/// The rate is sourced from settings at computation time and is never
/// cached on a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate(Decimal);

impl VatRate {
    /// Creates a rate from a decimal fraction (0.15 = 15%).
    #[inline]
    pub const fn new(fraction: Decimal) -> Self {
        VatRate(fraction)
    }

    /// Creates a rate from whole percentage points (15 = 15%).
    #[inline]
    pub fn from_percent(percent: i64) -> Self {
        VatRate(Decimal::new(percent, 2))
    }

    /// Returns the rate as a decimal fraction.
    #[inline]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        VatRate(Decimal::ZERO)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging and logs; receipt formatting belongs to callers.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        let line_total = unit_price.multiply_quantity(3).unwrap();
        assert_eq!(line_total.cents(), 897);

        assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_none());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }

    #[test]
    fn test_decimal_round_trip() {
        let money = Money::from_cents(1234);
        assert_eq!(money.to_decimal(), Decimal::from(1234));
        assert_eq!(Money::from_decimal_cents(money.to_decimal()), Some(money));
    }

    #[test]
    fn test_half_up_rounding() {
        // .5 rounds away from zero, everything else to nearest
        assert_eq!(
            Money::from_decimal_cents(Decimal::new(125, 1)), // 12.5
            Some(Money::from_cents(13))
        );
        assert_eq!(
            Money::from_decimal_cents(Decimal::new(124, 1)), // 12.4
            Some(Money::from_cents(12))
        );
        assert_eq!(
            Money::from_decimal_cents(Decimal::new(-125, 1)), // -12.5
            Some(Money::from_cents(-13))
        );
    }

    #[test]
    fn test_vat_rate() {
        let rate = VatRate::from_percent(15);
        assert_eq!(rate.as_decimal(), Decimal::new(15, 2));
        assert!(!rate.is_zero());
        assert!(VatRate::zero().is_zero());
    }
}
