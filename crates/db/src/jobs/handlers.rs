//! Built-in job handlers.

use std::sync::Arc;

use async_trait::async_trait;
use premia_core::commission::{CommissionCalculator, CommissionPolicy};
use premia_core::jobs::JobSummary;
use premia_core::posting::PostingPolicy;
use premia_core::reconciliation::MatchPolicy;
use premia_core::settlement::{PartnerType, SettlementType};
use premia_shared::AppError;
use premia_shared::config::AppConfig;
use sea_orm::DatabaseConnection;

use super::providers::{
    JsonStatementProvider, LedgerPremiumProvider, PremiumDataProvider, StatementProvider,
};
use super::{JobContext, JobHandler, Scheduler};
use crate::repositories::JournalRepository;
use crate::services::{
    GenerationOutcome, PostingEngine, ReconciliationService, SettlementNotifier, SettlementService,
    SettlementServiceError,
};

/// Reconciles the day's mobile money statement against posted receipts.
pub struct DailyReconciliationJob {
    service: ReconciliationService,
    statements: Arc<dyn StatementProvider>,
}

impl DailyReconciliationJob {
    /// Creates the job.
    #[must_use]
    pub fn new(service: ReconciliationService, statements: Arc<dyn StatementProvider>) -> Self {
        Self {
            service,
            statements,
        }
    }
}

#[async_trait]
impl JobHandler for DailyReconciliationJob {
    fn name(&self) -> &'static str {
        "daily-reconciliation"
    }

    async fn run(&self, ctx: &JobContext) -> JobSummary {
        let mut summary = JobSummary::new(self.name());
        let source = self.statements.source_name();

        match self.service.find_for_date(ctx.date, source).await {
            Ok(Some(existing)) => {
                summary.skip(format!("{source} {}: already reconciled ({})", ctx.date, existing.id));
                return summary;
            }
            Ok(None) => {}
            Err(err) => {
                summary.failure(describe(format_args!("{source} {}", ctx.date), err));
                return summary;
            }
        }

        let items = match self.statements.fetch(ctx.date).await {
            Ok(items) => items,
            Err(err) => {
                summary.failure(describe(format_args!("{source} {}", ctx.date), err));
                return summary;
            }
        };

        match self
            .service
            .create_reconciliation(ctx.date, source, &items, None)
            .await
        {
            Ok(Some(run)) => summary.success(format!(
                "{source} {}: {} of {} matched, variance {}",
                ctx.date, run.summary.matched_count, run.summary.total_items, run.summary.variance
            )),
            Ok(None) => summary.skip(format!("{source} {}: empty statement", ctx.date)),
            Err(err) => summary.failure(describe(format_args!("{source} {}", ctx.date), err)),
        }
        summary
    }
}

/// Generates each partner's service fee settlement for the period.
pub struct ServiceFeeSettlementJob {
    service: SettlementService,
}

impl ServiceFeeSettlementJob {
    /// Creates the job.
    #[must_use]
    pub const fn new(service: SettlementService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobHandler for ServiceFeeSettlementJob {
    fn name(&self) -> &'static str {
        "service-fee-settlements"
    }

    async fn run(&self, ctx: &JobContext) -> JobSummary {
        let mut summary = JobSummary::new(self.name());
        for partner in [PartnerType::Kba, PartnerType::Robs] {
            let outcome = self
                .service
                .generate_service_fee_settlement(partner, ctx.period)
                .await;
            record(&mut summary, partner, outcome);
        }
        summary
    }
}

/// Computes the period's commission distribution and generates the partner
/// commission settlements.
pub struct CommissionSettlementJob {
    service: SettlementService,
    premiums: Arc<dyn PremiumDataProvider>,
    policy: CommissionPolicy,
}

impl CommissionSettlementJob {
    /// Creates the job.
    #[must_use]
    pub fn new(
        service: SettlementService,
        premiums: Arc<dyn PremiumDataProvider>,
        policy: CommissionPolicy,
    ) -> Self {
        Self {
            service,
            premiums,
            policy,
        }
    }
}

#[async_trait]
impl JobHandler for CommissionSettlementJob {
    fn name(&self) -> &'static str {
        "commission-settlements"
    }

    async fn run(&self, ctx: &JobContext) -> JobSummary {
        let mut summary = JobSummary::new(self.name());
        let period = ctx.period;

        let riders = match self.premiums.fetch(period).await {
            Ok(riders) => riders,
            Err(err) => {
                summary.failure(describe("premium data", err));
                return summary;
            }
        };

        let result = match CommissionCalculator::calculate(&riders, &self.policy) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error_code = err.error_code(), error = %err, "Commission calculation failed");
                summary.failure(format!("commission: {err}"));
                return summary;
            }
        };
        tracing::info!(
            riders = result.rider_count,
            full_term = result.full_term_riders,
            total_commission = result.total_commission.get(),
            "Commission calculated"
        );

        match self
            .service
            .generate_commission_settlements(period, &result)
            .await
        {
            Ok(outcomes) => {
                for (partner, outcome) in [PartnerType::Kba, PartnerType::Robs]
                    .into_iter()
                    .zip(outcomes)
                {
                    record(&mut summary, partner, Ok::<_, SettlementServiceError>(outcome));
                }
            }
            Err(err) => summary.failure(describe("commission settlements", err)),
        }
        summary
    }
}

/// Failure detail carrying the error code.
fn describe(context: impl std::fmt::Display, err: impl Into<AppError>) -> String {
    let err = err.into();
    format!("{context}: [{}] {err}", err.error_code())
}

fn record<E: Into<AppError>>(
    summary: &mut JobSummary,
    partner: PartnerType,
    outcome: Result<GenerationOutcome, E>,
) {
    match outcome {
        Ok(GenerationOutcome::Created(s)) => {
            summary.success(format!("{partner}: created {} for {}", s.settlement_number, s.amount));
        }
        Ok(GenerationOutcome::Existing(s)) => {
            summary.skip(format!("{partner}: {} already exists", s.settlement_number));
        }
        Ok(GenerationOutcome::Skipped {
            settlement_type, ..
        }) => {
            let kind = match settlement_type {
                SettlementType::ServiceFee => "service fees",
                SettlementType::Commission => "commission",
            };
            summary.skip(format!("{partner}: no {kind} owed"));
        }
        Err(err) => summary.failure(describe(partner, err)),
    }
}

/// Scheduler with the three built-in jobs wired from configuration.
#[must_use]
pub fn standard_scheduler(
    db: &DatabaseConnection,
    config: &AppConfig,
    notifier: Arc<dyn SettlementNotifier>,
) -> Scheduler {
    let posting = PostingPolicy::from(&config.posting);
    let commission = CommissionPolicy::from(&config.commission);
    let engine = PostingEngine::new(db.clone(), posting);
    let settlements =
        SettlementService::new(db.clone(), engine, notifier, config.partners.clone());
    let reconciliation =
        ReconciliationService::new(db.clone(), MatchPolicy::from(&config.reconciliation));

    let statements = Arc::new(JsonStatementProvider::new(
        "mobile-money",
        config.reconciliation.statement_dir.clone(),
    ));
    let premiums = Arc::new(LedgerPremiumProvider::new(
        JournalRepository::new(db.clone()),
        posting,
        commission,
    ));

    Scheduler::builder()
        .register(Arc::new(DailyReconciliationJob::new(reconciliation, statements)))
        .register(Arc::new(ServiceFeeSettlementJob::new(settlements.clone())))
        .register(Arc::new(CommissionSettlementJob::new(
            settlements,
            premiums,
            commission,
        )))
        .build()
}
