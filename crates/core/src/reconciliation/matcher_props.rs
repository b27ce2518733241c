//! Property-based tests for the statement matcher.

use std::collections::HashSet;

use chrono::NaiveDate;
use premia_shared::types::{Cents, JournalEntryId};
use proptest::prelude::*;

use super::matcher::Matcher;
use super::types::{LedgerTransaction, MatchType, ReconciliationSummary, StatementItem};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap_or_default()
}

fn tx(reference: String, amount: i64) -> LedgerTransaction {
    LedgerTransaction {
        transaction_id: reference.clone(),
        reference,
        amount: Cents(amount),
        date: day(),
        journal_entry_id: JournalEntryId::new(),
    }
}

fn arb_reference() -> impl Strategy<Value = String> {
    "[A-Z]{2}-[0-9]{3,6}"
}

fn arb_statement() -> impl Strategy<Value = Vec<StatementItem>> {
    prop::collection::vec((arb_reference(), 1i64..20_000), 0..15).prop_map(|v| {
        v.into_iter()
            .map(|(reference, amount)| StatementItem {
                reference,
                amount: Cents(amount),
                date: day(),
            })
            .collect()
    })
}

fn arb_ledger() -> impl Strategy<Value = Vec<LedgerTransaction>> {
    prop::collection::vec((arb_reference(), 1i64..20_000), 0..15)
        .prop_map(|v| v.into_iter().map(|(r, a)| tx(r, a)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An item with an exact counterpart is matched Exact even when
    /// amount-only alternatives sit earlier in the ledger.
    #[test]
    fn prop_exact_takes_precedence(
        reference in arb_reference(),
        amount in 1i64..1_000_000,
        decoys in prop::collection::vec(arb_reference(), 0..5),
    ) {
        let mut ledger: Vec<_> = decoys
            .into_iter()
            .filter(|d| *d != reference)
            .map(|d| tx(d, amount))
            .collect();
        ledger.push(tx(reference.clone(), amount));
        let item = StatementItem { reference: reference.clone(), amount: Cents(amount), date: day() };

        let result = Matcher::default().match_items(&[item], &ledger);
        prop_assert_eq!(result[0].match_type, MatchType::Exact);
        prop_assert_eq!(result[0].transaction_id.as_deref(), Some(reference.as_str()));
    }

    /// No ledger transaction is ever claimed twice, and the summary counts add up.
    #[test]
    fn prop_claims_are_unique(items in arb_statement(), ledger in arb_ledger()) {
        // Unique transaction ids so claims can be told apart.
        let mut seen = HashSet::new();
        let ledger: Vec<_> = ledger.into_iter().filter(|t| seen.insert(t.transaction_id.clone())).collect();

        let matches = Matcher::default().match_items(&items, &ledger);
        prop_assert_eq!(matches.len(), items.len());

        let claimed: Vec<_> = matches.iter().filter_map(|m| m.transaction_id.clone()).collect();
        let distinct: HashSet<_> = claimed.iter().collect();
        prop_assert_eq!(distinct.len(), claimed.len());

        let summary = ReconciliationSummary::compute(&items, &matches);
        prop_assert_eq!(summary.matched_count + summary.unmatched_count, summary.total_items);
        prop_assert_eq!(summary.variance, summary.source_balance - summary.ledger_balance);
    }
}
