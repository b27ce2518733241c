//! Settlement error types.

use thiserror::Error;

use super::types::SettlementStatus;

/// Errors raised by settlement transitions and generation.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Attempted a transition from a state that does not allow it.
    #[error("Invalid settlement transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: SettlementStatus,
        /// The attempted target status.
        to: SettlementStatus,
    },

    /// Payout reference is required to start processing.
    #[error("Bank reference is required")]
    BankReferenceRequired,

    /// Confirmation id is required to complete.
    #[error("Confirmation reference is required")]
    ConfirmationRequired,

    /// Failure reason is required.
    #[error("Failure reason is required")]
    FailureReasonRequired,

    /// Cancellation reason is required.
    #[error("Cancellation reason is required")]
    CancellationReasonRequired,

    /// Settlement amount must be positive.
    #[error("Settlement amount must be positive")]
    NonPositiveAmount,

    /// Period start is after period end.
    #[error("Invalid settlement period")]
    InvalidPeriod,
}

impl SettlementError {
    /// Returns the error code for logs and job summaries.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::BankReferenceRequired => "BANK_REFERENCE_REQUIRED",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::FailureReasonRequired => "FAILURE_REASON_REQUIRED",
            Self::CancellationReasonRequired => "CANCELLATION_REASON_REQUIRED",
            Self::NonPositiveAmount | Self::InvalidPeriod => "VALIDATION_FAILURE",
        }
    }
}
