//! Double-entry bookkeeping logic.
//!
//! This module implements the pure side of the ledger:
//! - Account classification and normal balances
//! - Journal line validation (balance, one-sided lines)
//! - The standard chart of accounts
//! - Trial balance computation
//! - Date-prefixed document numbering

pub mod balance;
pub mod chart;
pub mod error;
pub mod numbering;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{TrialBalance, TrialBalanceLine, split_balance};
pub use chart::{ChartAccount, ChartNode, build_hierarchy, codes, standard_chart};
pub use error::LedgerError;
pub use numbering::NumberKind;
pub use types::{
    AccountStatus, AccountType, EntryDraft, EntryStatus, EntryType, GlAccount, JournalEntry,
    JournalLine, JournalLineInput, NormalBalance,
};
pub use validation::{EntryTotals, drop_zero_lines, validate_lines};
