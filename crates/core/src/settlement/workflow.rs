//! Settlement state machine.
//!
//! Each method validates one transition against the current status and
//! returns the `SettlementAction` carrying its audit data. Persisting the
//! action is the caller's job.

use chrono::Utc;
use premia_shared::types::ActorId;

use super::error::SettlementError;
use super::types::{SettlementAction, SettlementStatus};

/// Stateless guard for settlement transitions.
pub struct SettlementWorkflow;

impl SettlementWorkflow {
    /// Approve a pending settlement.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the settlement is Pending.
    pub fn approve(
        current: SettlementStatus,
        approved_by: ActorId,
    ) -> Result<SettlementAction, SettlementError> {
        match current {
            SettlementStatus::Pending => Ok(SettlementAction::Approve {
                approved_by,
                approved_at: Utc::now(),
            }),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Approved,
            }),
        }
    }

    /// Start the external payout of an approved settlement.
    ///
    /// # Errors
    ///
    /// `BankReferenceRequired` for a blank reference, `InvalidTransition`
    /// unless the settlement is Approved.
    pub fn process(
        current: SettlementStatus,
        bank_reference: String,
    ) -> Result<SettlementAction, SettlementError> {
        if bank_reference.trim().is_empty() {
            return Err(SettlementError::BankReferenceRequired);
        }

        match current {
            SettlementStatus::Approved => Ok(SettlementAction::Process {
                bank_reference,
                processed_at: Utc::now(),
            }),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Processing,
            }),
        }
    }

    /// Confirm a processing payout.
    ///
    /// # Errors
    ///
    /// `ConfirmationRequired` for a blank id, `InvalidTransition` unless the
    /// settlement is Processing.
    pub fn complete(
        current: SettlementStatus,
        confirmation_reference: String,
    ) -> Result<SettlementAction, SettlementError> {
        if confirmation_reference.trim().is_empty() {
            return Err(SettlementError::ConfirmationRequired);
        }

        match current {
            SettlementStatus::Processing => Ok(SettlementAction::Complete {
                confirmation_reference,
                settled_at: Utc::now(),
            }),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Completed,
            }),
        }
    }

    /// Mark a processing payout as failed.
    ///
    /// # Errors
    ///
    /// `FailureReasonRequired` for a blank reason, `InvalidTransition`
    /// unless the settlement is Processing.
    pub fn fail(
        current: SettlementStatus,
        failure_reason: String,
    ) -> Result<SettlementAction, SettlementError> {
        if failure_reason.trim().is_empty() {
            return Err(SettlementError::FailureReasonRequired);
        }

        match current {
            SettlementStatus::Processing => Ok(SettlementAction::Fail { failure_reason }),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Failed,
            }),
        }
    }

    /// Withdraw a pending settlement.
    ///
    /// # Errors
    ///
    /// `CancellationReasonRequired` for a blank reason, `InvalidTransition`
    /// unless the settlement is Pending.
    pub fn cancel(
        current: SettlementStatus,
        cancellation_reason: String,
    ) -> Result<SettlementAction, SettlementError> {
        if cancellation_reason.trim().is_empty() {
            return Err(SettlementError::CancellationReasonRequired);
        }

        match current {
            SettlementStatus::Pending => Ok(SettlementAction::Cancel {
                cancellation_reason,
            }),
            _ => Err(SettlementError::InvalidTransition {
                from: current,
                to: SettlementStatus::Cancelled,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: SettlementStatus, to: SettlementStatus) -> bool {
        matches!(
            (from, to),
            (
                SettlementStatus::Pending,
                SettlementStatus::Approved | SettlementStatus::Cancelled
            ) | (SettlementStatus::Approved, SettlementStatus::Processing)
                | (
                    SettlementStatus::Processing,
                    SettlementStatus::Completed | SettlementStatus::Failed
                )
        )
    }
}
