//! Commission calculation errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the commission calculator.
#[derive(Debug, Error)]
pub enum CommissionError {
    /// Policy constants are inconsistent.
    #[error("Invalid commission policy: {0}")]
    InvalidPolicy(&'static str),

    /// A rider premium was negative.
    #[error("Negative premium for rider {0}")]
    NegativePremium(Uuid),

    /// Arithmetic overflow.
    #[error("Commission arithmetic overflow")]
    Overflow,

    /// The post-calculation self-check found discrepancies.
    #[error("Commission self-check failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}

impl CommissionError {
    /// Returns the error code for logs and job summaries.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPolicy(_) => "INVALID_POLICY",
            Self::NegativePremium(_) | Self::Overflow | Self::ValidationFailed(_) => {
                "VALIDATION_FAILURE"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_lists_issues() {
        let err = CommissionError::ValidationFailed(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Commission self-check failed: a; b");
        assert_eq!(err.error_code(), "VALIDATION_FAILURE");
    }
}
