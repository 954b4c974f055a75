//! # Settlement Math
//!
//! Pure aggregation and fee arithmetic for cash-session settlement. The
//! orchestration around it (loading orders, closing the session row)
//! lives in forno-db; everything here is deterministic input → output.
//!
//! ## Session Close Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  completed orders ──► summarize ──► SessionSummary                     │
//! │                                       cash / pix / debit / credit      │
//! │                                       unclassified / grand_total       │
//! │                                            │                            │
//! │  opening balance  ────────────────────────┤                            │
//! │                                            ▼                            │
//! │                          expected_cash = opening + cash bucket         │
//! │                                            │                            │
//! │  counted cash     ────────────────────────┤                            │
//! │                                            ▼                            │
//! │            discrepancy = counted − expected (recorded, not blocked)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Order, PaymentMethod, Settings};

// =============================================================================
// Session Summary
// =============================================================================

/// Per-payment-method totals of a session's completed orders.
///
/// Every order lands in exactly one bucket. `Other` methods go to
/// `unclassified` — surfaced for operator attention and included in the
/// grand total, never silently discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSummary {
    pub cash_total: Money,
    pub pix_total: Money,
    pub debit_total: Money,
    pub credit_total: Money,
    pub unclassified_total: Money,
    pub grand_total: Money,
    pub order_count: usize,
}

/// Buckets every completed order's total by payment method.
pub fn summarize(orders: &[Order]) -> SessionSummary {
    let mut summary = SessionSummary::default();

    for order in orders {
        match order.payment_method {
            PaymentMethod::Cash => summary.cash_total += order.total,
            PaymentMethod::Pix => summary.pix_total += order.total,
            PaymentMethod::Debit => summary.debit_total += order.total,
            PaymentMethod::Credit => summary.credit_total += order.total,
            PaymentMethod::Other => summary.unclassified_total += order.total,
        }
        summary.grand_total += order.total;
        summary.order_count += 1;
    }

    summary
}

// =============================================================================
// Transaction Fees
// =============================================================================

/// Fee and net split of one transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeBreakdown {
    pub fee: Money,
    pub net: Money,
}

/// Computes the acquirer fee for a payment.
///
/// Only card methods carry a fee (debit and credit at their configured
/// rates); cash, PIX and unclassified methods settle at face value. The
/// net is derived by subtraction, so `fee + net == amount` always.
pub fn transaction_fee(amount: Money, method: PaymentMethod, settings: &Settings) -> FeeBreakdown {
    let rate = match method {
        PaymentMethod::Debit => settings.debit_fee_rate,
        PaymentMethod::Credit => settings.credit_fee_rate,
        PaymentMethod::Cash | PaymentMethod::Pix | PaymentMethod::Other => {
            return FeeBreakdown {
                fee: Money::zero(),
                net: amount,
            }
        }
    };

    let fee = amount.apply_rate(rate);
    FeeBreakdown {
        fee,
        net: amount - fee,
    }
}

/// Cash expected in the drawer at close: opening balance plus everything
/// paid in cash during the session.
pub fn expected_cash(opening_balance: Money, summary: &SessionSummary) -> Money {
    opening_balance + summary.cash_total
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Rate;
    use chrono::Utc;

    fn order(method: PaymentMethod, total_cents: i64) -> Order {
        let now = Utc::now();
        Order {
            id: format!("o-{method:?}-{total_cents}"),
            tenant_id: "t1".to_string(),
            session_id: "s1".to_string(),
            total: Money::from_cents(total_cents),
            discount: Money::zero(),
            change_given: Money::zero(),
            payment_method: method,
            fee_amount: Money::zero(),
            net_amount: Money::from_cents(total_cents),
            created_by: "op1".to_string(),
            created_at: now,
        }
    }

    fn fee_settings(debit_bps: u32, credit_bps: u32) -> Settings {
        let mut settings = Settings::default_for("t1", Utc::now());
        settings.debit_fee_rate = Rate::from_bps(debit_bps);
        settings.credit_fee_rate = Rate::from_bps(credit_bps);
        settings
    }

    /// Scenario: session opened with R$100.00, one cash order of
    /// R$50.00 and one credit order of R$30.00 at 4% fee.
    #[test]
    fn test_session_close_reference_case() {
        let orders = vec![
            order(PaymentMethod::Cash, 5_000),
            order(PaymentMethod::Credit, 3_000),
        ];

        let summary = summarize(&orders);
        assert_eq!(summary.cash_total, Money::from_units(50));
        assert_eq!(summary.credit_total, Money::from_units(30));
        assert_eq!(summary.grand_total, Money::from_units(80));

        let expected = expected_cash(Money::from_units(100), &summary);
        assert_eq!(expected, Money::from_units(150));

        let fee = transaction_fee(
            Money::from_units(30),
            PaymentMethod::Credit,
            &fee_settings(200, 400),
        );
        assert_eq!(fee.fee, Money::from_cents(120));
        assert_eq!(fee.net, Money::from_cents(2_880));
    }

    #[test]
    fn test_buckets_sum_to_grand_total() {
        let orders = vec![
            order(PaymentMethod::Cash, 1_250),
            order(PaymentMethod::Pix, 999),
            order(PaymentMethod::Debit, 3_075),
            order(PaymentMethod::Credit, 4_000),
            order(PaymentMethod::Other, 777),
        ];

        let summary = summarize(&orders);
        let bucket_sum = summary.cash_total
            + summary.pix_total
            + summary.debit_total
            + summary.credit_total
            + summary.unclassified_total;

        assert_eq!(bucket_sum, summary.grand_total);
        assert_eq!(summary.order_count, 5);
    }

    #[test]
    fn test_unclassified_is_surfaced_not_dropped() {
        let orders = vec![order(PaymentMethod::Other, 2_000)];
        let summary = summarize(&orders);

        assert_eq!(summary.unclassified_total, Money::from_units(20));
        assert_eq!(summary.grand_total, Money::from_units(20));
        // and it does not leak into the cash expectation
        assert_eq!(
            expected_cash(Money::from_units(100), &summary),
            Money::from_units(100)
        );
    }

    #[test]
    fn test_fee_only_on_card_methods() {
        let settings = fee_settings(150, 399);
        let amount = Money::from_units(100);

        assert_eq!(
            transaction_fee(amount, PaymentMethod::Debit, &settings).fee,
            Money::from_cents(150)
        );
        assert_eq!(
            transaction_fee(amount, PaymentMethod::Credit, &settings).fee,
            Money::from_cents(399)
        );
        for method in [PaymentMethod::Cash, PaymentMethod::Pix, PaymentMethod::Other] {
            let split = transaction_fee(amount, method, &settings);
            assert_eq!(split.fee, Money::zero());
            assert_eq!(split.net, amount);
        }
    }

    #[test]
    fn test_fee_plus_net_is_amount() {
        let settings = fee_settings(217, 389);
        for cents in [1, 99, 1_000, 12_345, 999_999] {
            let amount = Money::from_cents(cents);
            for method in [
                PaymentMethod::Cash,
                PaymentMethod::Pix,
                PaymentMethod::Debit,
                PaymentMethod::Credit,
                PaymentMethod::Other,
            ] {
                let split = transaction_fee(amount, method, &settings);
                assert_eq!(split.fee + split.net, amount);
            }
        }
    }

    #[test]
    fn test_empty_session_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.grand_total, Money::zero());
        assert_eq!(summary.order_count, 0);
        assert_eq!(
            expected_cash(Money::from_units(100), &summary),
            Money::from_units(100)
        );
    }
}
