//! Posting rule errors.

use premia_shared::types::Cents;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors raised while translating an event into journal lines.
#[derive(Debug, Error)]
pub enum PostingError {
    /// A required amount was zero or negative.
    #[error("{0} must be positive")]
    NonPositiveAmount(&'static str),

    /// Daily payment must cover at least one day.
    #[error("Daily payment must cover at least one day")]
    InvalidDays,

    /// Receipt is smaller than its fixed service fees.
    #[error("Receipt {amount} does not cover fixed fees {fees}")]
    ReceiptBelowFees {
        /// Amount received.
        amount: Cents,
        /// Fees owed on the receipt.
        fees: Cents,
    },

    /// The rule does not apply to this event.
    #[error("Not applicable: {0}")]
    NotApplicable(&'static str),

    /// Arithmetic overflow.
    #[error("Amount overflow")]
    Overflow,

    /// Generated lines failed ledger validation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl PostingError {
    /// Returns the error code for logs and job summaries.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(inner) => inner.error_code(),
            _ => "VALIDATION_FAILURE",
        }
    }
}
