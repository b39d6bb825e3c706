//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Prices, PO totals and production cost estimates are i64 cents.      │
//! │    Quantities stay f64 (kg, litres), and the single place the two      │
//! │    meet is `Money::from_exact_cents`, which rounds once, explicitly.   │
//! │    Every conversion and sum is checked: out-of-range yields `None`.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mbg_core::money::Money;
//!
//! let price_per_kg = Money::from_cents(1_250_000); // 12,500.00 per kg
//! let cost = price_per_kg.for_quantity(2.5).unwrap();
//! assert_eq!(cost.cents(), 3_125_000);
//! assert_eq!(price_per_kg.for_quantity(1e300), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Item.price_cents ──┬──► PurchaseOrderItem.unit_price ──► PO total
///                    │
///                    └──► Recipe cost ──► WorkOrder.estimated_cost
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Rounds an exact (fractional) cent amount to whole minor units.
    ///
    /// ## Rounding
    /// Half away from zero. This is the only place float amounts turn into
    /// money; callers that add several fractional amounts should sum the
    /// exact values and convert once.
    ///
    /// Returns `None` for NaN, infinity, or anything outside `i64` cents.
    pub fn from_exact_cents(cents: f64) -> Option<Money> {
        let rounded = cents.round();
        // i64::MAX as f64 is 2^63, itself out of range
        if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
            return None;
        }
        Some(Money(rounded as i64))
    }

    /// Price of a fractional quantity at this unit price.
    ///
    /// ## Example
    /// ```rust
    /// use mbg_core::money::Money;
    ///
    /// // 0.333 kg at 10.00 per kg = 3.33
    /// assert_eq!(Money::from_cents(1000).for_quantity(0.333).unwrap().cents(), 333);
    /// // 0.125 kg at 0.04 per kg = 0.005 → rounds to 0.01
    /// assert_eq!(Money::from_cents(4).for_quantity(0.125).unwrap().cents(), 1);
    /// ```
    pub fn for_quantity(&self, quantity: f64) -> Option<Money> {
        Money::from_exact_cents(self.0 as f64 * quantity)
    }

    /// Splits this amount evenly across `parts` units (e.g. cost per portion).
    ///
    /// Returns `None` when `parts` is not positive or the share is out of range.
    pub fn per_unit(&self, parts: f64) -> Option<Money> {
        if parts <= 0.0 {
            return None;
        }
        Money::from_exact_cents(self.0 as f64 / parts)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
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
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_for_quantity_rounds_half_away_from_zero() {
        let per_kg = Money::from_cents(1000);
        assert_eq!(per_kg.for_quantity(2.5), Some(Money::from_cents(2500)));
        assert_eq!(Money::from_cents(1).for_quantity(2.5), Some(Money::from_cents(3)));
        assert_eq!(Money::from_cents(-1).for_quantity(2.5), Some(Money::from_cents(-3)));
        assert_eq!(per_kg.for_quantity(0.0), Some(Money::zero()));
    }

    #[test]
    fn test_out_of_range_amounts_are_rejected() {
        let per_kg = Money::from_cents(1000);
        assert_eq!(per_kg.for_quantity(1e300), None);
        assert_eq!(per_kg.for_quantity(-1e300), None);
        assert_eq!(per_kg.for_quantity(f64::NAN), None);
        assert_eq!(Money::from_exact_cents(9.3e18), None);
        assert_eq!(Money::from_exact_cents(-1e19), None);
        assert_eq!(Money::from_cents(1).per_unit(1e-300), None);

        let near_max = Money::from_cents(i64::MAX - 1);
        assert_eq!(near_max.checked_add(Money::from_cents(1)), Some(Money::from_cents(i64::MAX)));
        assert_eq!(near_max.checked_add(Money::from_cents(2)), None);
    }

    #[test]
    fn test_per_unit() {
        let total = Money::from_cents(1000);
        assert_eq!(total.per_unit(3.0).unwrap().cents(), 333);
        assert_eq!(total.per_unit(0.0), None);
        assert_eq!(total.per_unit(-1.0), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);
    }
}
