//! Financial report generation.
//!
//! This module provides pure business logic for generating financial reports:
//! - Trial Balance
//! - Balance Sheet (with retained earnings)
//! - Income Statement
//! - Partner Statement
//! - Flat export rows

pub mod error;
pub mod export;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ReportError;
pub use export::{ExportRow, JournalRow, TrialBalanceRow, journal_rows, trial_balance_rows};
pub use service::ReportService;
pub use types::*;
