//! Property-based tests for report builders.

use premia_shared::types::{Cents, GlAccountId};
use proptest::prelude::*;

use super::service::ReportService;
use super::types::AccountActivity;
use crate::ledger::{AccountType, NormalBalance};

/// A balanced set of movements: each pair debits one account and credits another.
fn arb_balanced_activity() -> impl Strategy<Value = Vec<AccountActivity>> {
    let types = prop::sample::select(AccountType::ALL.to_vec());
    prop::collection::vec((types.clone(), types, 1i64..1_000_000), 1..30).prop_map(|moves| {
        let mut acts: Vec<AccountActivity> = AccountType::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| AccountActivity {
                account_id: GlAccountId::new(),
                code: format!("{}010", i + 1),
                name: t.as_str().to_string(),
                account_type: *t,
                debit: Cents::ZERO,
                credit: Cents::ZERO,
            })
            .collect();
        for (dr, cr, amount) in moves {
            let d = AccountType::ALL.iter().position(|t| *t == dr).unwrap_or(0);
            let c = AccountType::ALL.iter().position(|t| *t == cr).unwrap_or(0);
            acts[d].debit += Cents(amount);
            acts[c].credit += Cents(amount);
        }
        acts
    })
}

proptest! {
    /// Any balanced activity yields a balance sheet where assets equal
    /// liabilities plus equity (retained earnings included).
    #[test]
    fn prop_balance_sheet_balances(acts in arb_balanced_activity()) {
        let as_of = chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap_or_default();
        let sheet = ReportService::balance_sheet(as_of, &acts);
        prop_assert!(sheet.is_balanced);
        prop_assert_eq!(sheet.total_assets.cents, sheet.liabilities_and_equity.cents);
    }

    /// Net income equals credit-normal income less debit-normal expense.
    #[test]
    fn prop_net_income_matches_activity(acts in arb_balanced_activity()) {
        let day = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();
        let stmt = ReportService::income_statement(day, day, &acts).unwrap();
        let expected: Cents = acts
            .iter()
            .map(|a| match a.account_type {
                AccountType::Income => NormalBalance::Credit.balance_change(a.debit, a.credit),
                AccountType::Expense => -NormalBalance::Debit.balance_change(a.debit, a.credit),
                _ => Cents::ZERO,
            })
            .sum();
        prop_assert_eq!(stmt.net_income.cents, expected.get());
    }
}
