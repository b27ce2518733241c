//! Ledger domain types.
//!
//! Account classification, entry lifecycle, and the line shape every
//! posting rule produces before it reaches the journal store.

use chrono::NaiveDate;
use premia_shared::types::{Cents, GlAccountId, JournalEntryId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// General ledger account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources held (escrow, bank).
    Asset,
    /// Amounts owed (premium payable, partner payables).
    Liability,
    /// Owner capital and retained earnings.
    Equity,
    /// Fee and commission income.
    Income,
    /// Partner commission expense.
    Expense,
}

impl AccountType {
    /// All account types in statement order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
    ];

    /// Returns the normal balance side for this account type.
    ///
    /// Asset and Expense accounts increase with debits; everything else
    /// increases with credits.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The side on which an account's balance grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl NormalBalance {
    /// Signed balance change produced by a debit/credit pair.
    #[must_use]
    pub fn balance_change(self, debit: Cents, credit: Cents) -> Cents {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

/// Account lifecycle status. Accounts are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Accepts postings.
    Active,
    /// Kept for history, rejects postings.
    Inactive,
}

/// Journal entry lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Recorded but not applied to balances.
    Draft,
    /// Applied to balances. Lines are immutable.
    Posted,
    /// Posted and later offset by a reversal entry.
    Reversed,
}

impl EntryStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Reversed => "reversed",
        }
    }

    /// Returns true if the entry's lines affected account balances.
    #[must_use]
    pub const fn affects_balances(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag naming the business rule that produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    /// Initial deposit that opens a rider's cover.
    #[serde(rename = "payment-receipt-day1")]
    PaymentReceiptDay1,
    /// Daily premium payment covering one or more days.
    PaymentReceiptDaily,
    /// Refund owed to a rider, net of processing fee.
    RefundInitiation,
    /// Refund paid out of escrow.
    RefundPayout,
    /// Premium forwarded to the underwriter.
    PremiumRemittance,
    /// Service fees moved out of escrow to their owners.
    ServiceFeeDistribution,
    /// Commission received from the underwriter.
    CommissionReceipt,
    /// Partner commission recognised on settlement approval.
    CommissionAccrual,
    /// Partner settlement paid out.
    SettlementPayout,
    /// Offsets a previously posted entry.
    Reversal,
}

impl EntryType {
    /// Returns the string tag stored on the entry.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentReceiptDay1 => "payment-receipt-day1",
            Self::PaymentReceiptDaily => "payment-receipt-daily",
            Self::RefundInitiation => "refund-initiation",
            Self::RefundPayout => "refund-payout",
            Self::PremiumRemittance => "premium-remittance",
            Self::ServiceFeeDistribution => "service-fee-distribution",
            Self::CommissionReceipt => "commission-receipt",
            Self::CommissionAccrual => "commission-accrual",
            Self::SettlementPayout => "settlement-payout",
            Self::Reversal => "reversal",
        }
    }

    /// Parses a stored tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payment-receipt-day1" => Some(Self::PaymentReceiptDay1),
            "payment-receipt-daily" => Some(Self::PaymentReceiptDaily),
            "refund-initiation" => Some(Self::RefundInitiation),
            "refund-payout" => Some(Self::RefundPayout),
            "premium-remittance" => Some(Self::PremiumRemittance),
            "service-fee-distribution" => Some(Self::ServiceFeeDistribution),
            "commission-receipt" => Some(Self::CommissionReceipt),
            "commission-accrual" => Some(Self::CommissionAccrual),
            "settlement-payout" => Some(Self::SettlementPayout),
            "reversal" => Some(Self::Reversal),
            _ => None,
        }
    }

    /// Returns true for rider premium receipts (the reconcilable inflows).
    #[must_use]
    pub const fn is_receipt(self) -> bool {
        matches!(self, Self::PaymentReceiptDay1 | Self::PaymentReceiptDaily)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line to be written against the account identified by `account_code`.
///
/// By convention exactly one of `debit`/`credit` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// Chart of accounts code.
    pub account_code: String,
    /// Debit amount.
    pub debit: Cents,
    /// Credit amount.
    pub credit: Cents,
    /// Optional line memo.
    pub description: Option<String>,
}

impl JournalLineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Cents) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Cents::ZERO,
            description: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Cents) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Cents::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if both sides are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.debit.is_zero() && self.credit.is_zero()
    }

    /// Returns the same line with debit and credit swapped.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            account_code: self.account_code.clone(),
            debit: self.credit,
            credit: self.debit,
            description: self.description.clone(),
        }
    }
}

/// A complete entry request ready for the journal store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Rule that produced the entry.
    pub entry_type: EntryType,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Idempotency key of the originating business event.
    pub source_transaction_id: String,
    /// Rider the entry relates to, if any.
    pub rider_id: Option<Uuid>,
    /// Human readable description.
    pub description: String,
    /// Ordered lines.
    pub lines: Vec<JournalLineInput>,
}

/// Snapshot of a GL account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlAccount {
    /// Account ID.
    pub id: GlAccountId,
    /// Unique business code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Side on which the balance grows.
    pub normal_balance: NormalBalance,
    /// Running balance, interpreted per `normal_balance`.
    pub balance: Cents,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Display parent in the chart hierarchy.
    pub parent_id: Option<GlAccountId>,
}

/// Snapshot of a stored journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account posted to.
    pub account_id: GlAccountId,
    /// Account code at posting time.
    pub account_code: String,
    /// Debit amount.
    pub debit: Cents,
    /// Credit amount.
    pub credit: Cents,
    /// Optional memo.
    pub description: Option<String>,
}

/// Snapshot of a stored journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Human readable number (`JE-YYYYMMDD-NNNN`).
    pub entry_number: String,
    /// Rule that produced the entry.
    pub entry_type: EntryType,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Idempotency key of the originating business event.
    pub source_transaction_id: String,
    /// Rider the entry relates to, if any.
    pub rider_id: Option<Uuid>,
    /// Description.
    pub description: String,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Sum of debit lines (equal to the credit sum for any stored entry).
    #[must_use]
    pub fn total(&self) -> Cents {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Net credit to the given account code across this entry's lines.
    #[must_use]
    pub fn credited_to(&self, account_code: &str) -> Cents {
        self.lines
            .iter()
            .filter(|l| l.account_code == account_code)
            .map(|l| l.credit - l.debit)
            .sum()
    }
}
