//! Scheduled jobs.
//!
//! A [`Scheduler`] holds an explicit name → handler map built with
//! [`SchedulerBuilder`]. Something external (cron, a systemd timer) decides
//! when to run; the scheduler only dispatches one named run.

pub mod handlers;
pub mod providers;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use premia_core::jobs::JobSummary;
use premia_core::settlement::SettlementPeriod;

pub use handlers::{
    CommissionSettlementJob, DailyReconciliationJob, ServiceFeeSettlementJob, standard_scheduler,
};
pub use providers::{
    JsonStatementProvider, LedgerPremiumProvider, PremiumDataProvider, ProviderError,
    StatementProvider,
};

/// Inputs of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobContext {
    /// Business date the run is for.
    pub date: NaiveDate,
    /// Settlement period for period-based jobs.
    pub period: SettlementPeriod,
}

impl JobContext {
    /// Context for `date` with the previous calendar month as the period.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            period: previous_month(date),
        }
    }

    /// Replaces the settlement period.
    #[must_use]
    pub const fn with_period(mut self, period: SettlementPeriod) -> Self {
        self.period = period;
        self
    }
}

/// The calendar month before the one containing `date`.
fn previous_month(date: NaiveDate) -> SettlementPeriod {
    let end = date.with_day(1).and_then(|first| first.pred_opt());
    let start = end.and_then(|e| e.with_day(1));
    match (start, end) {
        (Some(start), Some(end)) => SettlementPeriod { start, end },
        _ => SettlementPeriod {
            start: date,
            end: date,
        },
    }
}

/// A named unit of scheduled work.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Name the job is triggered by.
    fn name(&self) -> &'static str;

    /// Runs the job once. Failures of individual units are recorded in the
    /// summary, not returned.
    async fn run(&self, ctx: &JobContext) -> JobSummary;
}

/// Job dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// No handler is registered under the name.
    #[error("Unknown job: {0}")]
    UnknownJob(String),
}

/// Dispatches job runs by name.
#[derive(Clone, Default)]
pub struct Scheduler {
    handlers: BTreeMap<&'static str, Arc<dyn JobHandler>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("jobs", &self.job_names())
            .finish()
    }
}

impl Scheduler {
    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    /// Registered job names, sorted.
    #[must_use]
    pub fn job_names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Runs the named job once.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJob` if no handler has that name.
    pub async fn run(&self, name: &str, ctx: &JobContext) -> Result<JobSummary, JobError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| JobError::UnknownJob(name.to_string()))?;

        tracing::info!(job = name, date = %ctx.date, "Job started");
        let summary = handler.run(ctx).await;
        if summary.is_clean() {
            tracing::info!(
                job = name,
                processed = summary.processed,
                succeeded = summary.succeeded,
                skipped = summary.skipped,
                "Job finished"
            );
        } else {
            tracing::warn!(
                job = name,
                processed = summary.processed,
                failed = summary.failed,
                "Job finished with failures"
            );
        }
        Ok(summary)
    }
}

/// Builds a [`Scheduler`].
#[derive(Default)]
pub struct SchedulerBuilder {
    handlers: BTreeMap<&'static str, Arc<dyn JobHandler>>,
}

impl SchedulerBuilder {
    /// Registers a handler under its own name, replacing any earlier one.
    #[must_use]
    pub fn register(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(handler.name(), handler);
        self
    }

    /// Finishes the scheduler.
    #[must_use]
    pub fn build(self) -> Scheduler {
        Scheduler {
            handlers: self.handlers,
        }
    }
}
