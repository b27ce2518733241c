//! Report data types.
//!
//! Amounts are carried as integer cents and, for presentation, as a
//! two-place major-unit decimal. The decimal is derived, never summed.

use chrono::NaiveDate;
use premia_shared::types::{Cents, GlAccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountType;
use crate::settlement::{PartnerType, SettlementStatus, SettlementType};

/// A presentation amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Integer cents (authoritative).
    pub cents: i64,
    /// Major units with two decimal places.
    pub amount: Decimal,
}

impl From<Cents> for Amount {
    fn from(value: Cents) -> Self {
        Self {
            cents: value.get(),
            amount: value.to_major(),
        }
    }
}

/// Debit/credit activity of one account over a reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountActivity {
    /// Account ID.
    pub account_id: GlAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Sum of debit lines.
    pub debit: Cents,
    /// Sum of credit lines.
    pub credit: Cents,
}

impl AccountActivity {
    /// Net balance on the account's normal side.
    #[must_use]
    pub fn net(&self) -> Cents {
        self.account_type
            .normal_balance()
            .balance_change(self.debit, self.credit)
    }
}

/// One account row of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Account ID.
    pub account_id: GlAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Net balance on the normal side.
    pub balance: Amount,
}

/// A group of accounts with its total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Amount,
    /// Accounts in this section, ordered by code.
    pub accounts: Vec<ReportLine>,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// As of date (inclusive).
    pub as_of: NaiveDate,
    /// Assets section.
    pub assets: ReportSection,
    /// Liabilities section.
    pub liabilities: ReportSection,
    /// Equity accounts.
    pub equity: ReportSection,
    /// Income minus expenses to date.
    pub retained_earnings: Amount,
    /// Total assets.
    pub total_assets: Amount,
    /// Total liabilities.
    pub total_liabilities: Amount,
    /// Equity accounts plus retained earnings.
    pub total_equity: Amount,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Amount,
    /// Whether assets equal liabilities plus equity.
    pub is_balanced: bool,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// Income section.
    pub income: ReportSection,
    /// Expense section.
    pub expenses: ReportSection,
    /// Income minus expenses.
    pub net_income: Amount,
}

/// Trial balance row for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReportLine {
    /// Account ID.
    pub account_id: GlAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Debit column.
    pub debit: Amount,
    /// Credit column.
    pub credit: Amount,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Account rows.
    pub accounts: Vec<TrialBalanceReportLine>,
    /// Total debit.
    pub total_debit: Amount,
    /// Total credit.
    pub total_credit: Amount,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// One ledger movement on a partner account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerActivity {
    /// Entry date.
    pub date: NaiveDate,
    /// Entry number.
    pub entry_number: String,
    /// Entry type tag.
    pub entry_type: String,
    /// Entry description.
    pub description: String,
    /// Account code.
    pub account_code: String,
    /// Debit amount.
    pub debit: Cents,
    /// Credit amount.
    pub credit: Cents,
}

/// Partner statement line with running balance owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerStatementLine {
    /// Entry date.
    pub date: NaiveDate,
    /// Entry number.
    pub entry_number: String,
    /// Entry type tag.
    pub entry_type: String,
    /// Entry description.
    pub description: String,
    /// Account code.
    pub account_code: String,
    /// Debit amount.
    pub debit: Amount,
    /// Credit amount.
    pub credit: Amount,
    /// Amount owed to the partner after this line.
    pub running_balance: Amount,
}

/// Settlement as listed on a partner statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummaryRow {
    /// Settlement number.
    pub settlement_number: String,
    /// Service fee or commission.
    pub settlement_type: SettlementType,
    /// Status.
    pub status: SettlementStatus,
    /// Period start.
    pub period_start: NaiveDate,
    /// Period end.
    pub period_end: NaiveDate,
    /// Amount.
    pub amount: Amount,
}

/// Settlement totals for a partner statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    /// Settlements overlapping the period.
    pub settlements: Vec<SettlementSummaryRow>,
    /// Sum of completed settlements.
    pub total_completed: Amount,
    /// Sum of settlements still in flight (pending, approved, processing).
    pub total_outstanding: Amount,
}

/// Partner statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerStatement {
    /// Partner.
    pub partner: PartnerType,
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// Partner payable accounts covered.
    pub account_codes: Vec<String>,
    /// Balance owed before the period.
    pub opening_balance: Amount,
    /// Chronological activity.
    pub lines: Vec<PartnerStatementLine>,
    /// Balance owed at period end.
    pub closing_balance: Amount,
    /// Settlement summary.
    pub settlements: SettlementSummary,
}
