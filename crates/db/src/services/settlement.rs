//! Settlement service: generation, lifecycle transitions and their ledger
//! side effects.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use premia_core::commission::CommissionResult;
use premia_core::ledger::{EntryStatus, EntryType, NumberKind, numbering};
use premia_core::posting::{PostingResult, SettlementPosting};
use premia_core::settlement::{
    PartnerType, Settlement, SettlementAction, SettlementError, SettlementPeriod,
    SettlementStatus, SettlementType, SettlementWorkflow,
};
use premia_shared::config::PartnersConfig;
use premia_shared::types::{ActorId, Cents, JournalEntryId, SettlementId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::notifier::{SettlementNotifier, recipients};
use super::posting::PostingEngine;
use crate::entities::{partner_settlements, sea_orm_active_enums as stored};
use crate::repositories::JournalError;
use crate::repositories::gl_account::is_unique_violation;

/// Attempts when a concurrent writer takes the settlement number.
const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Error types for settlement operations.
#[derive(Debug, thiserror::Error)]
pub enum SettlementServiceError {
    /// Settlement not found.
    #[error("Settlement not found: {0}")]
    NotFound(SettlementId),

    /// Transition or input rejected.
    #[error(transparent)]
    Workflow(#[from] SettlementError),

    /// Ledger lookup failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Settlement number allocation kept colliding.
    #[error("Could not allocate a settlement number")]
    NumberExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl SettlementServiceError {
    /// Returns the error code for logs and job summaries.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Workflow(e) => e.error_code(),
            Self::Journal(e) => e.error_code(),
            Self::NumberExhausted => "NUMBER_COLLISION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Result of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A new pending settlement was created.
    Created(Settlement),
    /// A non-cancelled settlement already covers the partner, type and period.
    Existing(Settlement),
    /// Nothing is owed for the period.
    Skipped {
        /// Partner.
        partner: PartnerType,
        /// Settlement type.
        settlement_type: SettlementType,
    },
}

/// A transition and the postings it triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Settlement after the transition.
    pub settlement: Settlement,
    /// Ledger postings attempted. A failed posting leaves the transition in
    /// place; [`SettlementService::ensure_postings`] retries it.
    pub postings: Vec<PostingResult>,
}

impl TransitionOutcome {
    /// Whether every attempted posting succeeded.
    #[must_use]
    pub fn postings_ok(&self) -> bool {
        self.postings.iter().all(|p| p.success)
    }
}

/// Settlement query filter. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementFilter {
    /// Partner.
    pub partner: Option<PartnerType>,
    /// Settlement type.
    pub settlement_type: Option<SettlementType>,
    /// Status.
    pub status: Option<SettlementStatus>,
    /// Settlements whose period overlaps this one.
    pub period: Option<SettlementPeriod>,
}

/// Settlement service.
#[derive(Clone)]
pub struct SettlementService {
    db: DatabaseConnection,
    engine: PostingEngine,
    notifier: Arc<dyn SettlementNotifier>,
    partners: PartnersConfig,
}

impl std::fmt::Debug for SettlementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementService")
            .field("engine", &self.engine)
            .field("partners", &self.partners)
            .finish_non_exhaustive()
    }
}

impl SettlementService {
    /// Creates a settlement service.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        engine: PostingEngine,
        notifier: Arc<dyn SettlementNotifier>,
        partners: PartnersConfig,
    ) -> Self {
        Self {
            db,
            engine,
            notifier,
            partners,
        }
    }

    /// Creates the service fee settlement owed to `partner` for `period`.
    ///
    /// The amount is the sum of credits to the partner's service fee payable
    /// from Posted entries dated in the period. Reversals and reversed
    /// entries are left out, so a reversed receipt contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or numbering keeps colliding.
    pub async fn generate_service_fee_settlement(
        &self,
        partner: PartnerType,
        period: SettlementPeriod,
    ) -> Result<GenerationOutcome, SettlementServiceError> {
        if let Some(existing) = self
            .find_active(partner, SettlementType::ServiceFee, period)
            .await?
        {
            return Ok(GenerationOutcome::Existing(existing));
        }

        let code = partner.service_fee_payable_code();
        let total: Cents = self
            .engine
            .journal()
            .get_by_date_range(period.start, period.end)
            .await?
            .iter()
            .filter(|e| e.status == EntryStatus::Posted && e.entry_type != EntryType::Reversal)
            .map(|e| e.credited_to(code))
            .sum();

        self.create_if_owed(partner, SettlementType::ServiceFee, total, period)
            .await
    }

    /// Creates one commission settlement per partner with a non-zero share.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or numbering keeps colliding.
    pub async fn generate_commission_settlements(
        &self,
        period: SettlementPeriod,
        result: &CommissionResult,
    ) -> Result<Vec<GenerationOutcome>, SettlementServiceError> {
        let mut outcomes = Vec::with_capacity(2);
        for (partner, amount) in [
            (PartnerType::Kba, result.distribution.kba),
            (PartnerType::Robs, result.distribution.robs),
        ] {
            let outcome = match self
                .find_active(partner, SettlementType::Commission, period)
                .await?
            {
                Some(existing) => GenerationOutcome::Existing(existing),
                None => {
                    self.create_if_owed(partner, SettlementType::Commission, amount, period)
                        .await?
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Approves a pending settlement. Commission settlements post their
    /// accrual.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Workflow` for an invalid transition.
    pub async fn approve(
        &self,
        id: SettlementId,
        approved_by: ActorId,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        self.transition(id, |status| SettlementWorkflow::approve(status, approved_by))
            .await
    }

    /// Starts the payout of an approved settlement.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Workflow` for a blank reference or invalid transition.
    pub async fn process(
        &self,
        id: SettlementId,
        bank_reference: &str,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        self.transition(id, |status| {
            SettlementWorkflow::process(status, bank_reference.to_string())
        })
        .await
    }

    /// Completes a processing settlement and posts its payout.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Workflow` for a blank confirmation or invalid
    /// transition.
    pub async fn complete(
        &self,
        id: SettlementId,
        confirmation_reference: &str,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        self.transition(id, |status| {
            SettlementWorkflow::complete(status, confirmation_reference.to_string())
        })
        .await
    }

    /// Marks a processing settlement as failed.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Workflow` for a blank reason or invalid transition.
    pub async fn fail(
        &self,
        id: SettlementId,
        reason: &str,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        self.transition(id, |status| SettlementWorkflow::fail(status, reason.to_string()))
            .await
    }

    /// Cancels a pending settlement.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Workflow` for a blank reason or invalid transition.
    pub async fn cancel(
        &self,
        id: SettlementId,
        reason: &str,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        self.transition(id, |status| SettlementWorkflow::cancel(status, reason.to_string()))
            .await
    }

    /// Posts any ledger side effect the settlement's status calls for and
    /// has not got yet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID. Posting and link failures are
    /// reported in the outcome.
    pub async fn ensure_postings(
        &self,
        id: SettlementId,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        let mut settlement = self.get_settlement(id).await?;
        let postings = self.apply_postings(&mut settlement).await;
        Ok(TransitionOutcome {
            settlement,
            postings,
        })
    }

    /// Looks up a settlement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID.
    pub async fn get_settlement(
        &self,
        id: SettlementId,
    ) -> Result<Settlement, SettlementServiceError> {
        partner_settlements::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(to_domain)
            .ok_or(SettlementServiceError::NotFound(id))
    }

    /// Lists settlements matching `filter`, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_settlements(
        &self,
        filter: SettlementFilter,
    ) -> Result<Vec<Settlement>, SettlementServiceError> {
        let mut query = partner_settlements::Entity::find();
        if let Some(partner) = filter.partner {
            query = query.filter(
                partner_settlements::Column::PartnerType.eq(stored::PartnerType::from(partner)),
            );
        }
        if let Some(settlement_type) = filter.settlement_type {
            query = query.filter(
                partner_settlements::Column::SettlementType
                    .eq(stored::SettlementType::from(settlement_type)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(
                partner_settlements::Column::Status.eq(stored::SettlementStatus::from(status)),
            );
        }
        if let Some(period) = filter.period {
            query = query
                .filter(partner_settlements::Column::PeriodStart.lte(period.end))
                .filter(partner_settlements::Column::PeriodEnd.gte(period.start));
        }
        let models = query
            .order_by_asc(partner_settlements::Column::SettlementNumber)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn find_active(
        &self,
        partner: PartnerType,
        settlement_type: SettlementType,
        period: SettlementPeriod,
    ) -> Result<Option<Settlement>, DbErr> {
        let model = partner_settlements::Entity::find()
            .filter(
                partner_settlements::Column::ActiveKey.eq(active_key(
                    partner,
                    settlement_type,
                    period,
                )),
            )
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    async fn create_if_owed(
        &self,
        partner: PartnerType,
        settlement_type: SettlementType,
        amount: Cents,
        period: SettlementPeriod,
    ) -> Result<GenerationOutcome, SettlementServiceError> {
        if amount.is_negative() {
            return Err(SettlementError::NonPositiveAmount.into());
        }
        if amount.is_zero() {
            tracing::info!(
                partner = %partner,
                settlement_type = %settlement_type,
                period_start = %period.start,
                period_end = %period.end,
                "Nothing owed, settlement skipped"
            );
            return Ok(GenerationOutcome::Skipped {
                partner,
                settlement_type,
            });
        }

        let today = Utc::now().date_naive();
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            match self
                .insert(partner, settlement_type, amount, period, today)
                .await
            {
                Ok(settlement) => {
                    tracing::info!(
                        settlement_number = %settlement.settlement_number,
                        partner = %partner,
                        settlement_type = %settlement_type,
                        amount = amount.get(),
                        "Settlement generated"
                    );
                    return Ok(GenerationOutcome::Created(settlement));
                }
                Err(err) if is_unique_violation(&err) => {
                    if let Some(existing) =
                        self.find_active(partner, settlement_type, period).await?
                    {
                        tracing::info!(
                            settlement_number = %existing.settlement_number,
                            partner = %partner,
                            settlement_type = %settlement_type,
                            "Settlement generated concurrently, using existing"
                        );
                        return Ok(GenerationOutcome::Existing(existing));
                    }
                    tracing::debug!("Settlement number taken, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(SettlementServiceError::NumberExhausted)
    }

    async fn insert(
        &self,
        partner: PartnerType,
        settlement_type: SettlementType,
        amount: Cents,
        period: SettlementPeriod,
        today: NaiveDate,
    ) -> Result<Settlement, DbErr> {
        let txn = self.db.begin().await?;
        let prefix = numbering::day_prefix(NumberKind::Settlement, today);
        let existing = partner_settlements::Entity::find()
            .filter(partner_settlements::Column::SettlementNumber.starts_with(&prefix))
            .count(&txn)
            .await?;
        let now = Utc::now().into();
        let inserted = partner_settlements::ActiveModel {
            id: Set(SettlementId::new().into_inner()),
            settlement_number: Set(numbering::next_number(
                NumberKind::Settlement,
                today,
                existing,
            )),
            partner_type: Set(partner.into()),
            settlement_type: Set(settlement_type.into()),
            status: Set(stored::SettlementStatus::Pending),
            total_amount: Set(amount.get()),
            period_start: Set(period.start),
            period_end: Set(period.end),
            approved_by: Set(None),
            approved_at: Set(None),
            bank_reference: Set(None),
            processed_at: Set(None),
            confirmation_reference: Set(None),
            settled_at: Set(None),
            failure_reason: Set(None),
            cancellation_reason: Set(None),
            accrual_entry_id: Set(None),
            payout_entry_id: Set(None),
            active_key: Set(Some(active_key(partner, settlement_type, period))),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await;
        match inserted {
            Ok(model) => {
                txn.commit().await?;
                Ok(to_domain(model))
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    async fn transition(
        &self,
        id: SettlementId,
        decide: impl FnOnce(SettlementStatus) -> Result<SettlementAction, SettlementError>,
    ) -> Result<TransitionOutcome, SettlementServiceError> {
        let txn = self.db.begin().await?;
        let model = partner_settlements::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(SettlementServiceError::NotFound(id))?;

        let from: SettlementStatus = model.status.into();
        let action = decide(from)?;
        let to = action.new_status();

        let mut active: partner_settlements::ActiveModel = model.into();
        active.status = Set(to.into());
        match action {
            SettlementAction::Approve {
                approved_by,
                approved_at,
            } => {
                active.approved_by = Set(Some(approved_by.into_inner()));
                active.approved_at = Set(Some(approved_at.into()));
            }
            SettlementAction::Process {
                bank_reference,
                processed_at,
            } => {
                active.bank_reference = Set(Some(bank_reference));
                active.processed_at = Set(Some(processed_at.into()));
            }
            SettlementAction::Complete {
                confirmation_reference,
                settled_at,
            } => {
                active.confirmation_reference = Set(Some(confirmation_reference));
                active.settled_at = Set(Some(settled_at.into()));
            }
            SettlementAction::Fail { failure_reason } => {
                active.failure_reason = Set(Some(failure_reason));
            }
            SettlementAction::Cancel {
                cancellation_reason,
            } => {
                active.cancellation_reason = Set(Some(cancellation_reason));
                active.active_key = Set(None);
            }
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        let mut settlement = to_domain(updated);
        tracing::info!(
            settlement_number = %settlement.settlement_number,
            from = %from,
            to = %to,
            "Settlement transitioned"
        );

        let postings = self.apply_postings(&mut settlement).await;
        if matches!(to, SettlementStatus::Approved | SettlementStatus::Completed) {
            self.notify(&settlement).await;
        }

        Ok(TransitionOutcome {
            settlement,
            postings,
        })
    }

    /// Posts the side effects the status calls for. Failures, including a
    /// failure to record the entry link, end up in the returned results.
    async fn apply_postings(&self, settlement: &mut Settlement) -> Vec<PostingResult> {
        let mut results = Vec::new();

        if settlement.needs_accrual() {
            let date = accounting_date(settlement.approved_at);
            let result = self
                .engine
                .post_commission_accrual(&posting_for(settlement, date))
                .await;
            let result = self
                .record_link(
                    settlement,
                    partner_settlements::Column::AccrualEntryId,
                    "commission-accrual",
                    result,
                )
                .await;
            if result.success {
                settlement.accrual_entry_id = result.journal_entry_id;
            }
            results.push(result);
        }

        if settlement.needs_payout() {
            let date = accounting_date(settlement.settled_at);
            let result = self
                .engine
                .post_settlement_payout(&posting_for(settlement, date))
                .await;
            let result = self
                .record_link(
                    settlement,
                    partner_settlements::Column::PayoutEntryId,
                    "settlement-payout",
                    result,
                )
                .await;
            if result.success {
                settlement.payout_entry_id = result.journal_entry_id;
            }
            results.push(result);
        }

        results
    }

    async fn record_link(
        &self,
        settlement: &Settlement,
        column: partner_settlements::Column,
        kind: &str,
        result: PostingResult,
    ) -> PostingResult {
        let Some(entry_id) = result.journal_entry_id else {
            warn_posting(settlement, kind, &result);
            return result;
        };
        match self.link_entry(settlement.id, column, entry_id).await {
            Ok(()) => result,
            Err(err) => {
                let failed = PostingResult {
                    success: false,
                    message: Some(format!("entry {entry_id} posted but not linked: {err}")),
                    ..result
                };
                warn_posting(settlement, kind, &failed);
                failed
            }
        }
    }

    async fn link_entry(
        &self,
        id: SettlementId,
        column: partner_settlements::Column,
        entry_id: JournalEntryId,
    ) -> Result<(), DbErr> {
        partner_settlements::Entity::update_many()
            .col_expr(column, Expr::value(entry_id.into_inner()))
            .col_expr(
                partner_settlements::Column::UpdatedAt,
                Expr::value(DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(partner_settlements::Column::Id.eq(id.into_inner()))
            .filter(column.is_null())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn notify(&self, settlement: &Settlement) {
        let notice = settlement.notice();
        let to = recipients(&self.partners, &notice);
        if to.is_empty() {
            tracing::debug!(
                settlement_number = %settlement.settlement_number,
                "No recipients configured, notification skipped"
            );
            return;
        }
        if let Err(err) = self.notifier.send(&to, &notice).await {
            tracing::warn!(
                settlement_number = %settlement.settlement_number,
                status = %settlement.status,
                error = %err,
                "Settlement notification failed"
            );
        }
    }
}

/// Unique per partner, type and period while a settlement holds the period.
fn active_key(
    partner: PartnerType,
    settlement_type: SettlementType,
    period: SettlementPeriod,
) -> String {
    format!("{partner}:{settlement_type}:{}:{}", period.start, period.end)
}

fn accounting_date(at: Option<DateTime<Utc>>) -> NaiveDate {
    at.unwrap_or_else(Utc::now).date_naive()
}

fn posting_for(settlement: &Settlement, date: NaiveDate) -> SettlementPosting {
    SettlementPosting {
        settlement_id: settlement.id,
        settlement_number: settlement.settlement_number.clone(),
        partner: settlement.partner,
        settlement_type: settlement.settlement_type,
        amount: settlement.amount,
        date,
    }
}

fn warn_posting(settlement: &Settlement, kind: &str, result: &PostingResult) {
    tracing::warn!(
        settlement_number = %settlement.settlement_number,
        posting = kind,
        message = result.message.as_deref().unwrap_or_default(),
        "Settlement posting failed, retry with ensure_postings"
    );
}

fn to_domain(model: partner_settlements::Model) -> Settlement {
    let utc = |t: Option<sea_orm::prelude::DateTimeWithTimeZone>| t.map(|t| t.with_timezone(&Utc));
    Settlement {
        id: SettlementId::from_uuid(model.id),
        settlement_number: model.settlement_number,
        partner: model.partner_type.into(),
        settlement_type: model.settlement_type.into(),
        status: model.status.into(),
        amount: Cents(model.total_amount),
        period: SettlementPeriod {
            start: model.period_start,
            end: model.period_end,
        },
        approved_by: model.approved_by.map(ActorId::from_uuid),
        approved_at: utc(model.approved_at),
        bank_reference: model.bank_reference,
        processed_at: utc(model.processed_at),
        confirmation_reference: model.confirmation_reference,
        settled_at: utc(model.settled_at),
        failure_reason: model.failure_reason,
        cancellation_reason: model.cancellation_reason,
        accrual_entry_id: model.accrual_entry_id.map(JournalEntryId::from_uuid),
        payout_entry_id: model.payout_entry_id.map(JournalEntryId::from_uuid),
    }
}
