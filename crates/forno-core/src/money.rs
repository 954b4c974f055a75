//! # Money Module
//!
//! Fixed-point decimal arithmetic for all monetary computation.
//!
//! ## Why Fixed-Point Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A recipe sums dozens of small ingredient lines; float residue          │
//! │  accumulates into visible cent-level drift on the final cost.           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Ten-Thousandths                                  │
//! │    R$0.0200/g × 500 g = 200 × 5_000_000 / 10_000 = 100_000 = R$10.00   │
//! │    Exact at every step; rounding happens once, half-up, per operation  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why 4 Decimal Places?
//! Unit costs are per *gram* or per *milliliter*. A 1 kg flour package at
//! R$20.00 costs R$0.0200/g — two decimals cannot hold that. Four decimals
//! keep per-base-unit costs exact while still being plain `i64` math.
//!
//! ## Usage
//! ```rust
//! use forno_core::money::{Money, Rate};
//!
//! let price = Money::from_units(20);        // R$20.0000
//! let rate = Rate::from_bps(1000);          // 10.00%
//! assert_eq!(price.apply_rate(rate), Money::from_units(2));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Number of fixed-point steps per whole currency unit (4 decimal places).
pub const MONEY_SCALE: i64 = 10_000;

/// Basis points in 100% (1 bp = 0.01%).
pub const BPS_SCALE: i64 = 10_000;

/// Integer division with half-up rounding. `d` must be positive.
#[inline]
const fn round_div(n: i128, d: i128) -> i64 {
    ((n + d / 2) / d) as i64
}

// =============================================================================
// Money
// =============================================================================

/// A monetary value in fixed-point ten-thousandths of a currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts and shortages
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **i128 intermediates**: Products/divisions widen before rounding, so
///   no overflow for any realistic amount
///
/// EVERY monetary value in the system flows through this type: package
/// prices, per-gram costs, recipe cost fields, order totals, drawer
/// balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from raw fixed-point steps (1 = R$0.0001).
    #[inline]
    pub const fn from_scaled(scaled: i64) -> Self {
        Money(scaled)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(20).scaled(), 200_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * MONEY_SCALE)
    }

    /// Creates a Money value from cents (hundredths).
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$10.99
    /// assert_eq!(price.scaled(), 109_900);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents * (MONEY_SCALE / 100))
    }

    /// Returns the raw fixed-point value.
    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / MONEY_SCALE
    }

    /// Returns the fractional portion in ten-thousandths (always 0-9999).
    #[inline]
    pub const fn frac_part(&self) -> i64 {
        (self.0 % MONEY_SCALE).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a basis-point rate with half-up rounding.
    ///
    /// ## Implementation
    /// Integer math: `(scaled × bps + 5000) / 10000`, widened to i128 so
    /// large amounts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::{Money, Rate};
    ///
    /// let prime = Money::from_units(16);      // R$16.0000
    /// let overhead = prime.apply_rate(Rate::from_bps(1000)); // 10%
    /// assert_eq!(overhead, Money::from_scaled(16_000));      // R$1.6000
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        Money(round_div(self.0 as i128 * rate.bps() as i128, BPS_SCALE as i128))
    }

    /// Multiplies by a physical quantity (e.g. cost/gram × grams).
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::{Money, Quantity};
    ///
    /// let per_gram = Money::from_scaled(200);          // R$0.0200/g
    /// let used = Quantity::from_units(500);            // 500 g
    /// assert_eq!(per_gram.mul_quantity(used), Money::from_units(10));
    /// ```
    pub fn mul_quantity(&self, qty: Quantity) -> Money {
        Money(round_div(self.0 as i128 * qty.scaled() as i128, MONEY_SCALE as i128))
    }

    /// Divides by a physical quantity (e.g. package price / package grams).
    ///
    /// A non-positive divisor yields exactly zero; cost derivation never
    /// divides by zero and never errors on malformed package data.
    pub fn div_quantity(&self, qty: Quantity) -> Money {
        if qty.scaled() <= 0 {
            return Money::zero();
        }
        Money(round_div(self.0 as i128 * MONEY_SCALE as i128, qty.scaled() as i128))
    }

    /// Divides by a plain integer count. Non-positive divisor yields zero.
    pub fn div_units(&self, n: i64) -> Money {
        if n <= 0 {
            return Money::zero();
        }
        Money(round_div(self.0 as i128, n as i128))
    }

    /// Grosses a cost up to the price whose `rate` share is left over:
    /// `price = self / (1 − rate)`.
    ///
    /// A rate at or above 100% would make the denominator non-positive
    /// and the price infinite or negative; it yields zero instead —
    /// callers clamp below the pole before asking.
    ///
    /// ## Example
    /// ```rust
    /// use forno_core::money::{Money, Rate};
    ///
    /// // R$4.40 grossed up over 28.49% ≈ R$6.1530
    /// let cost = Money::from_cents(440);
    /// assert_eq!(cost.gross_up(Rate::from_bps(2849)), Money::from_scaled(61_530));
    /// ```
    pub fn gross_up(&self, rate: Rate) -> Money {
        let denominator = BPS_SCALE - rate.bps() as i64;
        if denominator <= 0 {
            return Money::zero();
        }
        Money(round_div(
            self.0 as i128 * BPS_SCALE as i128,
            denominator as i128,
        ))
    }

    /// Ratio of this value to another, in basis points.
    ///
    /// Returns `None` when either side makes the ratio meaningless
    /// (non-positive denominator or negative numerator).
    pub fn ratio_to(&self, other: Money) -> Option<Rate> {
        if self.0 < 0 || other.0 <= 0 {
            return None;
        }
        Some(Rate::from_bps(round_div(
            self.0 as i128 * BPS_SCALE as i128,
            other.0 as i128,
        ) as u32))
    }
}

/// Display is for logs and debugging; the UI formats from raw values to
/// handle localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${}.{:04}", sign, self.units().abs(), self.frac_part())
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
    fn mul(self, n: i64) -> Self {
        Money(self.0 * n)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Rate (unsigned basis points)
// =============================================================================

/// A percentage rate in basis points (1 bp = 0.01%, 825 = 8.25%).
///
/// Used for tax rates, card fee rates, overhead rates and target margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (convenience for config input).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating sum of two rates.
    #[inline]
    pub const fn plus(&self, other: Rate) -> Rate {
        Rate(self.0.saturating_add(other.0))
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// SignedRate (margins can be negative)
// =============================================================================

/// A signed rate in basis points. A realized margin can go below zero when
/// a selling price does not even cover cost plus taxes and fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct SignedRate(i32);

impl SignedRate {
    #[inline]
    pub const fn from_bps(bps: i32) -> Self {
        SignedRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> i32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Quantity (physical amounts)
// =============================================================================

/// A physical quantity in fixed-point ten-thousandths: grams, milliliters,
/// countable units, or recipe yields. Shares the Money scale so
/// money × quantity stays a single rounding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_scaled(scaled: i64) -> Self {
        Quantity(scaled)
    }

    /// Creates a quantity from whole units (500 → 500 g, 4 → yield of 4).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MONEY_SCALE)
    }

    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Fixed-point product of two quantities (e.g. 2.5 cups × 120 g/cup).
    pub fn mul(&self, other: Quantity) -> Quantity {
        Quantity(round_div(self.0 as i128 * other.0 as i128, MONEY_SCALE as i128))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Mul<i64> for Quantity {
    type Output = Self;

    #[inline]
    fn mul(self, n: i64) -> Self {
        Quantity(self.0 * n)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:04}",
            sign,
            (self.0 / MONEY_SCALE).abs(),
            (self.0 % MONEY_SCALE).abs()
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Money::from_units(20).scaled(), 200_000);
        assert_eq!(Money::from_cents(1099).scaled(), 109_900);
        assert_eq!(Money::from_scaled(200).scaled(), 200);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "R$10.9900");
        assert_eq!(format!("{}", Money::from_scaled(200)), "R$0.0200");
        assert_eq!(format!("{}", Money::from_scaled(-55_000)), "-R$5.5000");
        assert_eq!(format!("{}", Money::zero()), "R$0.0000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(10);
        let b = Money::from_units(5);

        assert_eq!((a + b).scaled(), 150_000);
        assert_eq!((a - b).scaled(), 50_000);
        assert_eq!((a * 3).scaled(), 300_000);
        assert_eq!((-a).scaled(), -100_000);
    }

    #[test]
    fn test_apply_rate_basic() {
        // R$10.00 at 10% = R$1.00
        let amount = Money::from_units(10);
        assert_eq!(amount.apply_rate(Rate::from_bps(1000)), Money::from_units(1));
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // R$0.0001 at 50% = 0.5 steps → rounds to 1 step
        let amount = Money::from_scaled(1);
        assert_eq!(amount.apply_rate(Rate::from_bps(5000)).scaled(), 1);
        // 4% credit fee on R$30.00 = R$1.20 exactly
        let total = Money::from_units(30);
        assert_eq!(total.apply_rate(Rate::from_bps(400)), Money::from_cents(120));
    }

    #[test]
    fn test_mul_quantity() {
        // R$0.0200/g × 500 g = R$10.00
        let per_gram = Money::from_scaled(200);
        let used = Quantity::from_units(500);
        assert_eq!(per_gram.mul_quantity(used), Money::from_units(10));
    }

    #[test]
    fn test_div_quantity() {
        // R$20.00 / 1000 g = R$0.0200/g
        let price = Money::from_units(20);
        let qty = Quantity::from_units(1000);
        assert_eq!(price.div_quantity(qty).scaled(), 200);
    }

    #[test]
    fn test_div_by_zero_guards() {
        let price = Money::from_units(20);
        assert_eq!(price.div_quantity(Quantity::zero()), Money::zero());
        assert_eq!(price.div_quantity(Quantity::from_units(-5)), Money::zero());
        assert_eq!(price.div_units(0), Money::zero());
        assert_eq!(price.div_units(-3), Money::zero());
    }

    #[test]
    fn test_div_units() {
        // R$17.60 / 4 = R$4.40
        let total = Money::from_cents(1760);
        assert_eq!(total.div_units(4), Money::from_cents(440));
    }

    #[test]
    fn test_gross_up() {
        // R$5.00 over 50% margin → R$10.00
        let cost = Money::from_units(5);
        assert_eq!(cost.gross_up(Rate::from_bps(5000)), Money::from_units(10));

        // at or past the pole the result degrades to zero
        assert_eq!(cost.gross_up(Rate::from_bps(10_000)), Money::zero());
        assert_eq!(cost.gross_up(Rate::from_bps(12_000)), Money::zero());
    }

    #[test]
    fn test_ratio_to() {
        let part = Money::from_units(1);
        let whole = Money::from_units(4);
        assert_eq!(part.ratio_to(whole), Some(Rate::from_bps(2500)));
        assert_eq!(part.ratio_to(Money::zero()), None);
        assert_eq!((-part).ratio_to(whole), None);
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
        assert_eq!(Rate::from_bps(450).plus(Rate::from_bps(399)).bps(), 849);
    }

    #[test]
    fn test_signed_rate() {
        let margin = SignedRate::from_bps(-10_000);
        assert_eq!(margin.bps(), -10_000);
        assert!((margin.percentage() + 100.0).abs() < 0.001);
    }

    #[test]
    fn test_quantity_mul() {
        // 2.5 cups × 120 g/cup = 300 g
        let cups = Quantity::from_scaled(25_000);
        let per_cup = Quantity::from_units(120);
        assert_eq!(Quantity::mul(&cups, per_cup), Quantity::from_units(300));
    }

    /// Division precision loss is intentional and documented: splitting
    /// R$10.00 three ways loses one step, never silently regains it.
    #[test]
    fn test_division_precision_loss_documented() {
        let ten = Money::from_units(10);
        let third = ten.div_units(3); // 33_333 steps (half-up of 33_333.3)
        let reconstructed = third * 3; // 99_999 steps

        assert_eq!(reconstructed.scaled(), 99_999);
        assert_eq!((ten - reconstructed).scaled(), 1);
    }
}
