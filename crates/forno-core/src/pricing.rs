//! # Pricing Simulator
//!
//! Two interchangeable views of the same identity:
//!
//! ```text
//!     price = cost / (1 − (tax + fee + margin))
//! ```
//!
//! ## Margin-Driven vs Price-Driven
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  "I want 20% margin"  ──► suggest_price  ──►  R$6.15                   │
//! │                                                                         │
//! │  "I charge R$6.00"    ──► realized_margin ──► 18.2%                    │
//! │                                                                         │
//! │  Both modes share one safety ceiling: tax + fee + margin may never     │
//! │  reach 100%, or the denominator collapses and the price explodes.     │
//! │  The limit sits 1% below the true pole as headroom against rounding.  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure and stateless; rates come in as parameters, never from ambient
//! configuration.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate, SignedRate};

/// The margin returned for a price at or below zero: exactly −100%,
/// a sentinel meaning "fully impractical", never an error.
pub const IMPRACTICAL_MARGIN: SignedRate = SignedRate::from_bps(-10_000);

/// Highest total of tax + fee + margin the simulator will accept, in
/// basis points. One percent below 100% keeps the denominator strictly
/// positive even after rounding.
const MARGIN_CEILING_BPS: u32 = 9_900;

// =============================================================================
// Output Types
// =============================================================================

/// Where each slice of a selling price goes.
///
/// Profit is computed by subtraction, so the four parts reconcile back to
/// the price exactly: `tax + fee + profit + cost = price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub tax_amount: Money,
    pub fee_amount: Money,
    pub profit: Money,
}

/// Result of a margin-driven simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceQuote {
    /// Suggested selling price.
    pub price: Money,
    /// Margin actually applied (equals the request unless clamped).
    pub applied_margin: Rate,
    /// True when the requested margin exceeded the safety ceiling.
    pub clamped: bool,
    pub breakdown: PriceBreakdown,
}

// =============================================================================
// Simulator
// =============================================================================

/// Highest margin still accepted for the given tax and fee rates:
/// `max(0, 99% − (tax + fee))`.
///
/// ## Example
/// ```rust
/// use forno_core::money::Rate;
/// use forno_core::pricing::safe_margin_limit;
///
/// // 4.5% tax + 3.99% fee → at most 90.51% margin
/// let limit = safe_margin_limit(Rate::from_bps(450), Rate::from_bps(399));
/// assert_eq!(limit.bps(), 9051);
/// ```
pub fn safe_margin_limit(tax: Rate, fee: Rate) -> Rate {
    let used = tax.plus(fee).bps();
    if used >= MARGIN_CEILING_BPS {
        Rate::zero()
    } else {
        Rate::from_bps(MARGIN_CEILING_BPS - used)
    }
}

/// Margin-driven mode: suggests a selling price for a desired margin.
///
/// A requested margin above [`safe_margin_limit`] is clamped to it (and
/// flagged in the quote) instead of producing an infinite or negative
/// price.
pub fn suggest_price(cost: Money, tax: Rate, fee: Rate, desired_margin: Rate) -> PriceQuote {
    let limit = safe_margin_limit(tax, fee);
    let clamped = desired_margin > limit;
    let applied_margin = if clamped { limit } else { desired_margin };

    let price = cost.gross_up(tax.plus(fee).plus(applied_margin));

    PriceQuote {
        price,
        applied_margin,
        clamped,
        breakdown: breakdown(price, cost, tax, fee),
    }
}

/// Price-driven mode: the margin a target selling price realizes.
///
/// `margin = 1 − cost/price − (tax + fee)`. A price at or below zero
/// yields exactly [`IMPRACTICAL_MARGIN`].
pub fn realized_margin(cost: Money, price: Money, tax: Rate, fee: Rate) -> SignedRate {
    let cost_share = match cost.ratio_to(price) {
        Some(ratio) => ratio,
        // non-positive price (or negative cost): fully impractical
        None => return IMPRACTICAL_MARGIN,
    };

    let margin_bps =
        10_000i64 - cost_share.bps() as i64 - tax.bps() as i64 - fee.bps() as i64;

    SignedRate::from_bps(margin_bps as i32)
}

/// Splits a selling price into tax, card fee and profit for display.
///
/// Profit absorbs every rounding residue: the invariant
/// `tax + fee + profit + cost == price` holds exactly.
pub fn breakdown(price: Money, cost: Money, tax: Rate, fee: Rate) -> PriceBreakdown {
    let tax_amount = price.apply_rate(tax);
    let fee_amount = price.apply_rate(fee);
    let profit = price - cost - tax_amount - fee_amount;

    PriceBreakdown {
        tax_amount,
        fee_amount,
        profit,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TAX: Rate = Rate::from_bps(450); // 4.5%
    const FEE: Rate = Rate::from_bps(399); // 3.99%

    #[test]
    fn test_safe_margin_limit() {
        assert_eq!(safe_margin_limit(TAX, FEE).bps(), 9051);
        assert_eq!(safe_margin_limit(Rate::zero(), Rate::zero()).bps(), 9900);
        // rates that already eat the ceiling leave no margin at all
        assert_eq!(
            safe_margin_limit(Rate::from_bps(9_000), Rate::from_bps(900)).bps(),
            0
        );
    }

    /// Scenario: unit cost R$4.40, tax 4.5%, fee 3.99%, margin 20%
    /// → price ≈ 4.40 / (1 − 0.2849) ≈ R$6.15.
    #[test]
    fn test_suggest_price_reference_case() {
        let quote = suggest_price(Money::from_cents(440), TAX, FEE, Rate::from_bps(2_000));

        assert_eq!(quote.price, Money::from_scaled(61_530));
        assert_eq!(quote.applied_margin.bps(), 2_000);
        assert!(!quote.clamped);
        assert!(quote.price >= Money::from_cents(440));
    }

    #[test]
    fn test_suggest_price_clamps_excessive_margin() {
        let quote = suggest_price(Money::from_cents(440), TAX, FEE, Rate::from_bps(9_800));

        assert!(quote.clamped);
        assert_eq!(quote.applied_margin, safe_margin_limit(TAX, FEE));
        // denominator stayed strictly positive: finite, positive price
        assert!(quote.price.is_positive());
    }

    #[test]
    fn test_round_trip_margin() {
        for margin_bps in [500, 2_000, 3_500, 6_000] {
            let margin = Rate::from_bps(margin_bps);
            let quote = suggest_price(Money::from_cents(440), TAX, FEE, margin);
            let realized = realized_margin(Money::from_cents(440), quote.price, TAX, FEE);

            // round-trip within 1 bp of rounding residue
            assert!(
                (realized.bps() - margin_bps as i32).abs() <= 1,
                "margin {margin_bps} round-tripped to {}",
                realized.bps()
            );
        }
    }

    #[test]
    fn test_price_never_below_cost_within_limit() {
        let cost = Money::from_cents(997);
        for margin_bps in [0, 100, 4_000, 9_051] {
            let quote = suggest_price(cost, TAX, FEE, Rate::from_bps(margin_bps));
            assert!(quote.price >= cost, "margin {margin_bps} priced below cost");
        }
    }

    #[test]
    fn test_realized_margin_zero_price_is_sentinel() {
        assert_eq!(
            realized_margin(Money::from_cents(440), Money::zero(), TAX, FEE),
            IMPRACTICAL_MARGIN
        );
        assert_eq!(
            realized_margin(Money::from_cents(440), Money::from_units(-3), TAX, FEE),
            IMPRACTICAL_MARGIN
        );
    }

    #[test]
    fn test_realized_margin_can_go_negative() {
        // selling at cost with 8.49% of taxes+fees on top: margin < 0
        let cost = Money::from_units(10);
        let realized = realized_margin(cost, cost, TAX, FEE);
        assert_eq!(realized.bps(), -(TAX.bps() as i32 + FEE.bps() as i32));
    }

    #[test]
    fn test_breakdown_reconciles_exactly() {
        for price_cents in [615, 1_000, 1_337, 99_999] {
            let price = Money::from_cents(price_cents);
            let cost = Money::from_cents(440);
            let parts = breakdown(price, cost, TAX, FEE);

            assert_eq!(
                parts.tax_amount + parts.fee_amount + parts.profit + cost,
                price
            );
        }
    }

    #[test]
    fn test_breakdown_reconciles_in_both_modes() {
        let quote = suggest_price(Money::from_cents(440), TAX, FEE, Rate::from_bps(2_000));
        let parts = quote.breakdown;
        assert_eq!(
            parts.tax_amount + parts.fee_amount + parts.profit + Money::from_cents(440),
            quote.price
        );
    }
}
