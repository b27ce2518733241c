//! Property-based tests for the allocation table.

use chrono::NaiveDate;
use premia_shared::types::Cents;
use proptest::prelude::*;

use super::rules::PostingRules;
use super::types::{PaymentReceipt, ReceiptKind, RefundInitiation};
use crate::ledger::{codes, validate_lines};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap_or_default()
}

fn arb_kind() -> impl Strategy<Value = ReceiptKind> {
    prop_oneof![
        Just(ReceiptKind::DayOne),
        (1u32..=30).prop_map(|days| ReceiptKind::Daily { days }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every receipt that covers its fees balances exactly, debits escrow by
    /// the full amount, and leaves the remainder on premium payable.
    #[test]
    fn prop_receipt_split_balances(kind in arb_kind(), extra in 0i64..10_000_000) {
        let rules = PostingRules::default();
        let fees = rules.receipt_fees(kind).unwrap();
        let amount = fees.total() + Cents(extra);
        let draft = rules.payment_receipt(&PaymentReceipt {
            source_transaction_id: "MM-P".into(),
            rider_id: None,
            amount,
            date: day(),
            kind,
        }).unwrap();

        let totals = validate_lines(&draft.lines).unwrap();
        prop_assert_eq!(totals.debit, amount);

        let escrow: Cents = draft.lines.iter()
            .filter(|l| l.account_code == codes::MOBILE_MONEY_ESCROW)
            .map(|l| l.debit)
            .sum();
        prop_assert_eq!(escrow, amount);

        let premium: Cents = draft.lines.iter()
            .filter(|l| l.account_code == codes::PREMIUM_PAYABLE)
            .map(|l| l.credit)
            .sum();
        prop_assert_eq!(premium, Cents(extra));
    }

    /// Daily fee lines are exactly N times the single-day fees.
    #[test]
    fn prop_daily_fees_scale_linearly(days in 1u32..=365) {
        let rules = PostingRules::default();
        let one = rules.receipt_fees(ReceiptKind::Daily { days: 1 }).unwrap();
        let many = rules.receipt_fees(ReceiptKind::Daily { days }).unwrap();
        let n = i64::from(days);
        prop_assert_eq!(many.platform, Cents(one.platform.get() * n));
        prop_assert_eq!(many.kba, Cents(one.kba.get() * n));
        prop_assert_eq!(many.robs, Cents(one.robs.get() * n));
    }

    /// Refund initiation always balances and never emits a zero line.
    #[test]
    fn prop_refund_balances(amount in 1i64..10_000_000, fee in 0i64..100_000) {
        let draft = PostingRules::default().refund_initiation(&RefundInitiation {
            source_transaction_id: "RF-P".into(),
            rider_id: None,
            amount: Cents(amount),
            fee: Cents(fee),
            date: day(),
        }).unwrap();
        prop_assert!(validate_lines(&draft.lines).is_ok());
        prop_assert!(draft.lines.iter().all(|l| !l.is_zero()));
    }
}
