//! Standard chart of accounts and hierarchy display.

use serde::Serialize;

use super::types::{AccountType, GlAccount};

/// Account codes the posting rules write to.
pub mod codes {
    /// Mobile money collections held in escrow.
    pub const MOBILE_MONEY_ESCROW: &str = "1010";
    /// Platform operating bank account.
    pub const OPERATING_BANK: &str = "1020";
    /// Premium owed to the underwriter.
    pub const PREMIUM_PAYABLE: &str = "2010";
    /// Refunds owed to riders.
    pub const REFUNDS_PAYABLE: &str = "2020";
    /// KBA service fee owed.
    pub const KBA_SERVICE_FEE_PAYABLE: &str = "2030";
    /// ROBS service fee owed.
    pub const ROBS_SERVICE_FEE_PAYABLE: &str = "2040";
    /// KBA commission owed.
    pub const KBA_COMMISSION_PAYABLE: &str = "2050";
    /// ROBS commission owed.
    pub const ROBS_COMMISSION_PAYABLE: &str = "2060";
    /// Owner capital.
    pub const OWNER_CAPITAL: &str = "3010";
    /// Platform service fee income.
    pub const PLATFORM_SERVICE_FEE_INCOME: &str = "4010";
    /// Commission income from the underwriter.
    pub const COMMISSION_INCOME: &str = "4020";
    /// Refund processing fee income.
    pub const REFUND_PROCESSING_FEE_INCOME: &str = "4030";
    /// Commission passed on to partners.
    pub const PARTNER_COMMISSION_EXPENSE: &str = "5010";
}

/// Definition of one account in the standard chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartAccount {
    /// Account code.
    pub code: &'static str,
    /// Account name.
    pub name: &'static str,
    /// Classification.
    pub account_type: AccountType,
    /// Parent code for display grouping.
    pub parent_code: Option<&'static str>,
}

const fn acct(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent_code: Option<&'static str>,
) -> ChartAccount {
    ChartAccount {
        code,
        name,
        account_type,
        parent_code,
    }
}

const STANDARD_CHART: [ChartAccount; 18] = [
    acct("1000", "Assets", AccountType::Asset, None),
    acct("1010", "Mobile Money Escrow", AccountType::Asset, Some("1000")),
    acct("1020", "Operating Bank Account", AccountType::Asset, Some("1000")),
    acct("2000", "Liabilities", AccountType::Liability, None),
    acct("2010", "Premium Payable to Underwriter", AccountType::Liability, Some("2000")),
    acct("2020", "Refunds Payable", AccountType::Liability, Some("2000")),
    acct("2030", "KBA Service Fee Payable", AccountType::Liability, Some("2000")),
    acct("2040", "ROBS Service Fee Payable", AccountType::Liability, Some("2000")),
    acct("2050", "KBA Commission Payable", AccountType::Liability, Some("2000")),
    acct("2060", "ROBS Commission Payable", AccountType::Liability, Some("2000")),
    acct("3000", "Equity", AccountType::Equity, None),
    acct("3010", "Owner Capital", AccountType::Equity, Some("3000")),
    acct("4000", "Income", AccountType::Income, None),
    acct("4010", "Platform Service Fee Income", AccountType::Income, Some("4000")),
    acct("4020", "Commission Income", AccountType::Income, Some("4000")),
    acct("4030", "Refund Processing Fee Income", AccountType::Income, Some("4000")),
    acct("5000", "Expenses", AccountType::Expense, None),
    acct("5010", "Partner Commission Expense", AccountType::Expense, Some("5000")),
];

/// Returns the standard chart, parents before children.
#[must_use]
pub fn standard_chart() -> &'static [ChartAccount] {
    &STANDARD_CHART
}

/// An account with its display children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartNode {
    /// The account.
    pub account: GlAccount,
    /// Child accounts ordered by code.
    pub children: Vec<ChartNode>,
}

/// Arranges flat accounts into a display hierarchy ordered by code.
///
/// Accounts whose parent is missing from the input are treated as roots.
#[must_use]
pub fn build_hierarchy(mut accounts: Vec<GlAccount>) -> Vec<ChartNode> {
    fn attach(account: GlAccount, pool: &[GlAccount]) -> ChartNode {
        let kids = pool
            .iter()
            .filter(|c| c.parent_id == Some(account.id))
            .cloned()
            .map(|c| attach(c, pool))
            .collect();
        ChartNode {
            account,
            children: kids,
        }
    }

    accounts.sort_by(|a, b| a.code.cmp(&b.code));

    let known: std::collections::HashSet<_> = accounts.iter().map(|a| a.id).collect();
    let (roots, children): (Vec<_>, Vec<_>) = accounts
        .into_iter()
        .partition(|a| a.parent_id.is_none_or(|p| !known.contains(&p)));

    roots.into_iter().map(|r| attach(r, &children)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::AccountStatus;
    use premia_shared::types::{Cents, GlAccountId};
    use std::collections::HashSet;

    #[test]
    fn test_standard_chart_codes_unique() {
        let codes: HashSet<_> = standard_chart().iter().map(|a| a.code).collect();
        assert_eq!(codes.len(), standard_chart().len());
    }

    #[test]
    fn test_parents_precede_children() {
        let mut seen = HashSet::new();
        for account in standard_chart() {
            if let Some(parent) = account.parent_code {
                assert!(seen.contains(parent), "{} before parent", account.code);
            }
            seen.insert(account.code);
        }
    }

    #[test]
    fn test_child_types_match_parent() {
        for account in standard_chart() {
            if let Some(parent) = account.parent_code {
                let parent = standard_chart().iter().find(|a| a.code == parent).unwrap();
                assert_eq!(parent.account_type, account.account_type);
            }
        }
    }

    #[test]
    fn test_build_hierarchy() {
        let parent_id = GlAccountId::new();
        let mk = |code: &str, id: GlAccountId, parent: Option<GlAccountId>| GlAccount {
            id,
            code: code.to_string(),
            name: code.to_string(),
            account_type: AccountType::Asset,
            normal_balance: AccountType::Asset.normal_balance(),
            balance: Cents::ZERO,
            status: AccountStatus::Active,
            parent_id: parent,
        };
        let accounts = vec![
            mk("1020", GlAccountId::new(), Some(parent_id)),
            mk("1000", parent_id, None),
            mk("1010", GlAccountId::new(), Some(parent_id)),
        ];
        let tree = build_hierarchy(accounts);
        assert_eq!(tree.len(), 1);
        let codes: Vec<_> = tree[0]
            .children
            .iter()
            .map(|c| c.account.code.as_str())
            .collect();
        assert_eq!(codes, vec!["1010", "1020"]);
    }
}
