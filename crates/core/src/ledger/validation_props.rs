//! Property-based tests for journal line validation rules.

use premia_shared::types::Cents;
use proptest::prelude::*;

use super::error::LedgerError;
use super::types::JournalLineInput;
use super::validation::validate_lines;

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy producing a debit total split into several credit lines.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLineInput>> {
    prop::collection::vec(positive_amount(), 1..6).prop_map(|credits| {
        let total: i64 = credits.iter().sum();
        let mut lines = vec![JournalLineInput::debit("1010", Cents(total))];
        lines.extend(
            credits
                .into_iter()
                .enumerate()
                .map(|(i, c)| JournalLineInput::credit(format!("20{i}0"), Cents(c))),
        );
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any split of a debit into credits validates and reports equal totals.
    #[test]
    fn prop_balanced_lines_accepted(lines in balanced_lines()) {
        let totals = validate_lines(&lines);
        prop_assert!(totals.is_ok());
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Nudging any single line by one cent breaks the balance.
    #[test]
    fn prop_one_cent_off_rejected(lines in balanced_lines(), pick in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let i = pick.index(lines.len());
        if lines[i].debit.is_positive() {
            lines[i].debit += Cents(1);
        } else {
            lines[i].credit += Cents(1);
        }
        let is_unbalanced = matches!(validate_lines(&lines), Err(LedgerError::Unbalanced { .. }));
        prop_assert!(is_unbalanced);
    }

    /// A zero-amount line is rejected even when totals agree.
    #[test]
    fn prop_zero_line_rejected(lines in balanced_lines()) {
        let mut lines = lines;
        lines.push(JournalLineInput::credit("4030", Cents::ZERO));
        let is_invalid = matches!(validate_lines(&lines), Err(LedgerError::InvalidLine { .. }));
        prop_assert!(is_invalid);
    }
}
