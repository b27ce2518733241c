//! Ledger error types for validation and state errors.

use premia_shared::types::Cents;
use thiserror::Error;

use super::types::EntryStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry is not balanced (debits != credits).
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Cents,
        /// Total credit amount.
        credit: Cents,
    },

    /// A line is negative, empty, or carries both sides.
    #[error("Line {index} must carry exactly one positive side")]
    InvalidLine {
        /// Zero-based line position.
        index: usize,
    },

    /// Line totals overflowed.
    #[error("Entry totals overflow")]
    AmountOverflow,

    // ========== Account Errors ==========
    /// Account code already exists.
    #[error("Account code '{0}' already exists")]
    DuplicateAccount(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Account still carries a balance and cannot be deactivated.
    #[error("Account {code} has non-zero balance {balance}")]
    AccountHasBalance {
        /// Account code.
        code: String,
        /// Current balance.
        balance: Cents,
    },

    // ========== Entry Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(String),

    /// Only posted entries can be reversed.
    #[error("Cannot reverse entry in status {0}")]
    CannotReverse(EntryStatus),
}

impl LedgerError {
    /// Returns the error code for logs and job summaries.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines | Self::InvalidLine { .. } | Self::AmountOverflow => {
                "VALIDATION_FAILURE"
            }
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::AccountNotFound(_) | Self::EntryNotFound(_) => "NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountHasBalance { .. } => "ACCOUNT_HAS_BALANCE",
            Self::CannotReverse(_) => "INVALID_STATE_TRANSITION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_display() {
        let err = LedgerError::Unbalanced {
            debit: Cents(10_000),
            credit: Cents(5_000),
        };
        assert_eq!(
            err.to_string(),
            "Entry is not balanced. Debit: 100.00, Credit: 50.00"
        );
        assert_eq!(err.error_code(), "UNBALANCED");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::DuplicateAccount("1010".into()).error_code(),
            "DUPLICATE_ACCOUNT"
        );
        assert_eq!(
            LedgerError::AccountNotFound("9999".into()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            LedgerError::CannotReverse(EntryStatus::Draft).error_code(),
            "INVALID_STATE_TRANSITION"
        );
        assert_eq!(
            LedgerError::InvalidLine { index: 0 }.error_code(),
            "VALIDATION_FAILURE"
        );
    }
}
