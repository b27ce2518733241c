//! Conversions from database-layer errors into [`AppError`].

use premia_shared::AppError;

use crate::jobs::ProviderError;
use crate::repositories::{GlAccountError, JournalError, ReportQueryError};
use crate::services::{ReconciliationError, SettlementServiceError};

/// Maps an error code and message onto the application error kinds.
fn classify(code: &'static str, message: String) -> AppError {
    match code {
        "NOT_FOUND" => AppError::NotFound(message),
        "DUPLICATE_ACCOUNT" | "ALREADY_POSTED" | "ALREADY_CLAIMED" | "NUMBER_COLLISION" => {
            AppError::Conflict(message)
        }
        "INVALID_STATE_TRANSITION" => AppError::InvalidState(message),
        "DATABASE_ERROR" | "CONCURRENT_MODIFICATION" => AppError::Database(message),
        _ => AppError::Validation(message),
    }
}

macro_rules! into_app_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    classify(err.error_code(), err.to_string())
                }
            }
        )+
    };
}

into_app_error!(
    GlAccountError,
    JournalError,
    ReportQueryError,
    ReconciliationError,
    SettlementServiceError,
);

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Io(e) => Self::ExternalService(e.to_string()),
            ProviderError::Parse(e) => Self::Validation(e.to_string()),
            ProviderError::Journal(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premia_core::ledger::LedgerError;
    use premia_core::settlement::{SettlementError, SettlementStatus};
    use premia_shared::types::Cents;

    #[test]
    fn test_codes_survive_conversion() {
        let err: AppError = JournalError::NotFound("JE-1".into()).into();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err: AppError = JournalError::Ledger(LedgerError::Unbalanced {
            debit: Cents(100),
            credit: Cents(90),
        })
        .into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: AppError = SettlementServiceError::Workflow(SettlementError::InvalidTransition {
            from: SettlementStatus::Completed,
            to: SettlementStatus::Approved,
        })
        .into();
        assert_eq!(err.error_code(), "INVALID_STATE_TRANSITION");
    }

    #[test]
    fn test_provider_io_is_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk");
        let err: AppError = ProviderError::Io(io).into();
        assert!(err.is_retryable());
    }
}
