//! Balance arithmetic and the trial balance health check.

use premia_shared::types::{Cents, GlAccountId};
use serde::{Deserialize, Serialize};

use super::types::{AccountStatus, AccountType, GlAccount, NormalBalance};

/// Splits a signed normal-side balance into (debit, credit) columns.
///
/// A debit-normal account with a positive balance sits in the debit column;
/// a negative balance flips it to the other column.
#[must_use]
pub fn split_balance(normal: NormalBalance, balance: Cents) -> (Cents, Cents) {
    match (normal, balance.is_negative()) {
        (NormalBalance::Debit, false) => (balance, Cents::ZERO),
        (NormalBalance::Debit, true) => (Cents::ZERO, balance.abs()),
        (NormalBalance::Credit, false) => (Cents::ZERO, balance),
        (NormalBalance::Credit, true) => (balance.abs(), Cents::ZERO),
    }
}

/// One account row of a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: GlAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Debit column.
    pub debit: Cents,
    /// Credit column.
    pub credit: Cents,
}

/// Trial balance over every active account.
///
/// `is_balanced` is a derived health check. A mismatch indicates a posting
/// bug and is reported as-is, never corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Account rows ordered by code.
    pub lines: Vec<TrialBalanceLine>,
    /// Sum of the debit column.
    pub total_debit: Cents,
    /// Sum of the credit column.
    pub total_credit: Cents,
    /// Whether the two columns agree.
    pub is_balanced: bool,
}

impl TrialBalance {
    /// Builds a trial balance from account snapshots, skipping inactive ones.
    #[must_use]
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a GlAccount>) -> Self {
        let mut lines: Vec<TrialBalanceLine> = accounts
            .into_iter()
            .filter(|a| a.status == AccountStatus::Active)
            .map(|a| {
                let (debit, credit) = split_balance(a.normal_balance, a.balance);
                TrialBalanceLine {
                    account_id: a.id,
                    code: a.code.clone(),
                    name: a.name.clone(),
                    account_type: a.account_type,
                    debit,
                    credit,
                }
            })
            .collect();
        lines.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Cents = lines.iter().map(|l| l.debit).sum();
        let total_credit: Cents = lines.iter().map(|l| l.credit).sum();

        Self {
            lines,
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }

    /// Difference between the debit and credit columns.
    #[must_use]
    pub fn difference(&self) -> Cents {
        self.total_debit - self.total_credit
    }
}
