//! Scheduled job outcomes.
//!
//! Job handlers live in the database crate; the summary they return is a
//! plain value so the worker can print it and tests can assert on it.

use serde::{Deserialize, Serialize};

/// Outcome of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job name.
    pub job: String,
    /// Units of work looked at.
    pub processed: usize,
    /// Units completed.
    pub succeeded: usize,
    /// Units that failed.
    pub failed: usize,
    /// Units intentionally skipped (nothing to do).
    pub skipped: usize,
    /// One human readable note per unit.
    pub details: Vec<String>,
}

impl JobSummary {
    /// Starts an empty summary for `job`.
    #[must_use]
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            ..Self::default()
        }
    }

    /// Records a success.
    pub fn success(&mut self, detail: impl Into<String>) {
        self.processed += 1;
        self.succeeded += 1;
        self.details.push(detail.into());
    }

    /// Records a failure.
    pub fn failure(&mut self, detail: impl Into<String>) {
        self.processed += 1;
        self.failed += 1;
        self.details.push(detail.into());
    }

    /// Records a skip.
    pub fn skip(&mut self, detail: impl Into<String>) {
        self.processed += 1;
        self.skipped += 1;
        self.details.push(detail.into());
    }

    /// True when nothing failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = JobSummary::new("service-fee-settlements");
        summary.success("kba: STL-20260131-0001");
        summary.skip("robs: nothing to settle");
        summary.failure("robs: database unavailable");

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_clean());
        assert_eq!(summary.details.len(), 3);
    }
}
