//! Flat export rows for external renderers (CSV, spreadsheets).
//!
//! Cells are strings; amounts are rendered in major units.

use crate::ledger::{JournalEntry, TrialBalance};

/// A row that knows its column headers.
pub trait ExportRow {
    /// Column headers, in cell order.
    fn columns() -> &'static [&'static str];

    /// Cell values, one per column.
    fn cells(&self) -> Vec<String>;
}

/// Trial balance export row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBalanceRow {
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type tag.
    pub account_type: String,
    /// Debit column in major units.
    pub debit: String,
    /// Credit column in major units.
    pub credit: String,
}

impl ExportRow for TrialBalanceRow {
    fn columns() -> &'static [&'static str] {
        &["code", "name", "account_type", "debit", "credit"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            self.account_type.clone(),
            self.debit.clone(),
            self.credit.clone(),
        ]
    }
}

/// Journal export row, one per entry line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRow {
    /// Entry number.
    pub entry_number: String,
    /// Entry date (ISO 8601).
    pub entry_date: String,
    /// Entry type tag.
    pub entry_type: String,
    /// Entry status.
    pub status: String,
    /// Source transaction ID.
    pub source_transaction_id: String,
    /// Account code.
    pub account_code: String,
    /// Debit in major units.
    pub debit: String,
    /// Credit in major units.
    pub credit: String,
    /// Line memo, falling back to the entry description.
    pub description: String,
}

impl ExportRow for JournalRow {
    fn columns() -> &'static [&'static str] {
        &[
            "entry_number",
            "entry_date",
            "entry_type",
            "status",
            "source_transaction_id",
            "account_code",
            "debit",
            "credit",
            "description",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.entry_number.clone(),
            self.entry_date.clone(),
            self.entry_type.clone(),
            self.status.clone(),
            self.source_transaction_id.clone(),
            self.account_code.clone(),
            self.debit.clone(),
            self.credit.clone(),
            self.description.clone(),
        ]
    }
}

/// Flattens a trial balance into export rows.
#[must_use]
pub fn trial_balance_rows(balance: &TrialBalance) -> Vec<TrialBalanceRow> {
    balance
        .lines
        .iter()
        .map(|l| TrialBalanceRow {
            code: l.code.clone(),
            name: l.name.clone(),
            account_type: l.account_type.as_str().to_string(),
            debit: l.debit.to_major().to_string(),
            credit: l.credit.to_major().to_string(),
        })
        .collect()
}

/// Flattens journal entries into one row per line, preserving order.
#[must_use]
pub fn journal_rows(entries: &[JournalEntry]) -> Vec<JournalRow> {
    entries
        .iter()
        .flat_map(|e| {
            e.lines.iter().map(move |l| JournalRow {
                entry_number: e.entry_number.clone(),
                entry_date: e.entry_date.to_string(),
                entry_type: e.entry_type.as_str().to_string(),
                status: e.status.as_str().to_string(),
                source_transaction_id: e.source_transaction_id.clone(),
                account_code: l.account_code.clone(),
                debit: l.debit.to_major().to_string(),
                credit: l.credit.to_major().to_string(),
                description: l.description.clone().unwrap_or_else(|| e.description.clone()),
            })
        })
        .collect()
}
