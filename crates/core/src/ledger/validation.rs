//! Business rule validation for journal entries.

use premia_shared::types::Cents;

use super::error::LedgerError;
use super::types::JournalLineInput;

/// Debit and credit totals of a validated line set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Sum of debits.
    pub debit: Cents,
    /// Sum of credits.
    pub credit: Cents,
}

/// Validates that a set of journal lines may be posted.
///
/// Every line must carry exactly one strictly positive side, there must be
/// at least two lines, and debits must equal credits exactly.
///
/// # Errors
///
/// Returns the first rule violated.
pub fn validate_lines(lines: &[JournalLineInput]) -> Result<EntryTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    let mut debit = Cents::ZERO;
    let mut credit = Cents::ZERO;

    for (index, line) in lines.iter().enumerate() {
        let one_sided = (line.debit.is_positive() && line.credit.is_zero())
            || (line.credit.is_positive() && line.debit.is_zero());
        if !one_sided {
            return Err(LedgerError::InvalidLine { index });
        }

        debit = debit
            .checked_add(line.debit)
            .ok_or(LedgerError::AmountOverflow)?;
        credit = credit
            .checked_add(line.credit)
            .ok_or(LedgerError::AmountOverflow)?;
    }

    if debit != credit {
        return Err(LedgerError::Unbalanced { debit, credit });
    }

    Ok(EntryTotals { debit, credit })
}

/// Removes lines whose debit and credit are both zero.
#[must_use]
pub fn drop_zero_lines(lines: Vec<JournalLineInput>) -> Vec<JournalLineInput> {
    lines.into_iter().filter(|l| !l.is_zero()).collect()
}
