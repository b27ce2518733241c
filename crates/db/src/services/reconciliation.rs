//! Reconciliation service: matches external statements against receipts.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use premia_core::ledger::EntryType;
use premia_core::reconciliation::{
    ItemMatch, ItemStatus, LedgerTransaction, MatchPolicy, MatchType, Matcher, Reconciliation,
    ReconciliationItem, ReconciliationStatus, ReconciliationSummary, ReconciliationType,
    StatementItem,
};
use premia_shared::types::{
    ActorId, Cents, JournalEntryId, ReconciliationId, ReconciliationItemId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{reconciliation_items, reconciliations, sea_orm_active_enums as stored};
use crate::repositories::{JournalError, JournalRepository};

/// Error types for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    /// Reconciliation, item or ledger transaction not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The item is not in a state the operation accepts.
    #[error("Item {item} is {status:?}")]
    InvalidState {
        /// Item ID.
        item: ReconciliationItemId,
        /// Current status.
        status: ItemStatus,
    },

    /// The ledger transaction is already matched to another item of the
    /// same reconciliation.
    #[error("Transaction {transaction_id} is already matched to item {item}")]
    AlreadyClaimed {
        /// Source transaction ID.
        transaction_id: String,
        /// Item holding the match.
        item: ReconciliationItemId,
    },

    /// Resolving an item needs a note.
    #[error("Resolution notes are required")]
    ResolutionNotesRequired,

    /// Ledger lookup failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ReconciliationError {
    /// Returns the error code for logs and job summaries.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE_TRANSITION",
            Self::AlreadyClaimed { .. } => "ALREADY_CLAIMED",
            Self::ResolutionNotesRequired => "VALIDATION_FAILURE",
            Self::Journal(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Reconciliation service.
#[derive(Debug, Clone)]
pub struct ReconciliationService {
    db: DatabaseConnection,
    journal: JournalRepository,
    matcher: Matcher,
}

impl ReconciliationService {
    /// Creates a reconciliation service.
    #[must_use]
    pub fn new(db: DatabaseConnection, policy: MatchPolicy) -> Self {
        Self {
            journal: JournalRepository::new(db.clone()),
            db,
            matcher: Matcher::new(policy),
        }
    }

    /// Matches a day's statement against that day's posted receipts and
    /// stores the run.
    ///
    /// Returns `None` without writing anything when the statement is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or write fails.
    pub async fn create_reconciliation(
        &self,
        date: NaiveDate,
        source_name: &str,
        items: &[StatementItem],
        created_by: Option<ActorId>,
    ) -> Result<Option<Reconciliation>, ReconciliationError> {
        if items.is_empty() {
            tracing::info!(%date, source_name, "Empty statement, reconciliation skipped");
            return Ok(None);
        }

        let ledger = self.receipts_on(date).await?;
        let matches = self.matcher.match_items(items, &ledger);
        let summary = ReconciliationSummary::compute(items, &matches);
        let entry_of: HashMap<&str, JournalEntryId> = ledger
            .iter()
            .map(|t| (t.transaction_id.as_str(), t.journal_entry_id))
            .collect();

        let id = ReconciliationId::new();
        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        reconciliations::ActiveModel {
            id: Set(id.into_inner()),
            reconciliation_type: Set(ReconciliationType::DailyMobileMoney.into()),
            reconciliation_date: Set(date),
            source_name: Set(source_name.to_string()),
            source_balance: Set(summary.source_balance.get()),
            ledger_balance: Set(summary.ledger_balance.get()),
            variance: Set(summary.variance.get()),
            total_items: Set(to_i32(summary.total_items)),
            matched_count: Set(to_i32(summary.matched_count)),
            unmatched_count: Set(to_i32(summary.unmatched_count)),
            manual_matched_count: Set(to_i32(summary.manual_matched_count)),
            status: Set(summary.status.into()),
            created_by: Set(created_by.map(ActorId::into_inner)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for (index, (item, matched)) in items.iter().zip(&matches).enumerate() {
            let entry_id = matched
                .transaction_id
                .as_deref()
                .and_then(|t| entry_of.get(t).copied());
            reconciliation_items::ActiveModel {
                id: Set(ReconciliationItemId::new().into_inner()),
                reconciliation_id: Set(id.into_inner()),
                line_number: Set(i32::try_from(index + 1).unwrap_or(i32::MAX)),
                source_reference: Set(item.reference.clone()),
                source_amount: Set(item.amount.get()),
                source_date: Set(item.date),
                matched_transaction_id: Set(matched.transaction_id.clone()),
                matched_journal_entry_id: Set(entry_id.map(JournalEntryId::into_inner)),
                ledger_amount: Set(matched.ledger_amount.map(Cents::get)),
                match_type: Set(matched.match_type.into()),
                match_confidence: Set(i32::from(matched.confidence)),
                status: Set(item_status(matched).into()),
                resolved_by: Set(None),
                resolution_notes: Set(None),
                resolved_at: Set(None),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        tracing::info!(
            reconciliation_id = %id,
            %date,
            source_name,
            total_items = summary.total_items,
            matched = summary.matched_count,
            unmatched = summary.unmatched_count,
            variance = summary.variance.get(),
            status = ?summary.status,
            "Reconciliation created"
        );

        self.get_reconciliation(id).await.map(Some)
    }

    /// Links an item to a ledger transaction by hand.
    ///
    /// The transaction amount is added to the ledger balance and the
    /// reconciliation's counts, variance and status are recomputed under a
    /// lock on the reconciliation row.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown item or transaction, `InvalidState` if the
    /// item is already matched, `AlreadyClaimed` if another item of the same
    /// reconciliation holds the transaction.
    pub async fn manual_match(
        &self,
        item_id: ReconciliationItemId,
        transaction_id: &str,
        matched_by: ActorId,
        notes: Option<&str>,
    ) -> Result<Reconciliation, ReconciliationError> {
        let entry = self
            .journal
            .get_by_source_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| ReconciliationError::NotFound(transaction_id.to_string()))?;
        let amount = entry.total();

        let txn = self.db.begin().await?;
        let item = find_item(&txn, item_id).await?;
        let reconciliation = reconciliations::Entity::find_by_id(item.reconciliation_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ReconciliationError::NotFound(item.reconciliation_id.to_string()))?;
        // Re-read now that the reconciliation is locked.
        let item = find_item(&txn, item_id).await?;

        if item.status == stored::ItemStatus::Matched {
            return Err(ReconciliationError::InvalidState {
                item: item_id,
                status: item.status.into(),
            });
        }

        let holder = reconciliation_items::Entity::find()
            .filter(reconciliation_items::Column::ReconciliationId.eq(reconciliation.id))
            .filter(reconciliation_items::Column::MatchedTransactionId.eq(transaction_id))
            .filter(reconciliation_items::Column::Status.eq(stored::ItemStatus::Matched))
            .one(&txn)
            .await?;
        if let Some(holder) = holder {
            return Err(ReconciliationError::AlreadyClaimed {
                transaction_id: transaction_id.to_string(),
                item: ReconciliationItemId::from_uuid(holder.id),
            });
        }

        let now = Utc::now().into();
        let mut active_item: reconciliation_items::ActiveModel = item.into();
        active_item.matched_transaction_id = Set(Some(transaction_id.to_string()));
        active_item.matched_journal_entry_id = Set(Some(entry.id.into_inner()));
        active_item.ledger_amount = Set(Some(amount.get()));
        active_item.match_type = Set(stored::MatchType::Manual);
        active_item.match_confidence = Set(i32::from(MatchType::Manual.confidence()));
        active_item.status = Set(stored::ItemStatus::Matched);
        active_item.resolved_by = Set(Some(matched_by.into_inner()));
        active_item.resolution_notes = Set(notes.map(str::to_string));
        active_item.resolved_at = Set(Some(now));
        active_item.update(&txn).await?;

        let summary = summary_of(&reconciliation).with_manual_match(amount);
        let reconciliation_id = reconciliation.id;
        let mut active: reconciliations::ActiveModel = reconciliation.into();
        active.ledger_balance = Set(summary.ledger_balance.get());
        active.variance = Set(summary.variance.get());
        active.matched_count = Set(to_i32(summary.matched_count));
        active.unmatched_count = Set(to_i32(summary.unmatched_count));
        active.manual_matched_count = Set(to_i32(summary.manual_matched_count));
        active.status = Set(summary.status.into());
        active.updated_at = Set(now);
        active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            item_id = %item_id,
            transaction_id,
            matched_by = %matched_by,
            "Reconciliation item matched manually"
        );

        self.get_reconciliation(ReconciliationId::from_uuid(reconciliation_id))
            .await
    }

    /// Closes an unmatched item without linking it. Counts are unchanged: a
    /// resolved item is still unmatched.
    ///
    /// # Errors
    ///
    /// `ResolutionNotesRequired` for blank notes, `NotFound`, or
    /// `InvalidState` unless the item is unmatched.
    pub async fn resolve_item(
        &self,
        item_id: ReconciliationItemId,
        resolved_by: ActorId,
        notes: &str,
    ) -> Result<ReconciliationItem, ReconciliationError> {
        if notes.trim().is_empty() {
            return Err(ReconciliationError::ResolutionNotesRequired);
        }

        let txn = self.db.begin().await?;
        let item = reconciliation_items::Entity::find_by_id(item_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ReconciliationError::NotFound(item_id.to_string()))?;

        if item.status != stored::ItemStatus::Unmatched {
            return Err(ReconciliationError::InvalidState {
                item: item_id,
                status: item.status.into(),
            });
        }

        let mut active: reconciliation_items::ActiveModel = item.into();
        active.status = Set(stored::ItemStatus::Resolved);
        active.resolved_by = Set(Some(resolved_by.into_inner()));
        active.resolution_notes = Set(Some(notes.trim().to_string()));
        active.resolved_at = Set(Some(Utc::now().into()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(item_id = %item_id, resolved_by = %resolved_by, "Reconciliation item resolved");
        Ok(item_to_domain(updated))
    }

    /// Loads a reconciliation with its items in statement order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID.
    pub async fn get_reconciliation(
        &self,
        id: ReconciliationId,
    ) -> Result<Reconciliation, ReconciliationError> {
        let model = reconciliations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| ReconciliationError::NotFound(id.to_string()))?;
        self.assemble(model).await
    }

    /// Finds the reconciliation of `source_name` for `date`, if one was run.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_for_date(
        &self,
        date: NaiveDate,
        source_name: &str,
    ) -> Result<Option<Reconciliation>, ReconciliationError> {
        let model = reconciliations::Entity::find()
            .filter(reconciliations::Column::ReconciliationDate.eq(date))
            .filter(reconciliations::Column::SourceName.eq(source_name))
            .order_by_desc(reconciliations::Column::CreatedAt)
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(Some(self.assemble(model).await?)),
            None => Ok(None),
        }
    }

    /// Posted receipts dated `date`, as matchable ledger transactions.
    async fn receipts_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<LedgerTransaction>, ReconciliationError> {
        let entries = self
            .journal
            .get_posted_by_types(
                &[EntryType::PaymentReceiptDay1, EntryType::PaymentReceiptDaily],
                date,
                date,
            )
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| LedgerTransaction {
                amount: e.total(),
                reference: e.source_transaction_id.clone(),
                transaction_id: e.source_transaction_id,
                date: e.entry_date,
                journal_entry_id: e.id,
            })
            .collect())
    }

    async fn assemble(
        &self,
        model: reconciliations::Model,
    ) -> Result<Reconciliation, ReconciliationError> {
        let items = reconciliation_items::Entity::find()
            .filter(reconciliation_items::Column::ReconciliationId.eq(model.id))
            .order_by_asc(reconciliation_items::Column::LineNumber)
            .all(&self.db)
            .await?;
        Ok(Reconciliation {
            id: ReconciliationId::from_uuid(model.id),
            reconciliation_type: model.reconciliation_type.into(),
            date: model.reconciliation_date,
            source_name: model.source_name.clone(),
            summary: summary_of(&model),
            created_by: model.created_by.map(ActorId::from_uuid),
            items: items.into_iter().map(item_to_domain).collect(),
        })
    }
}

async fn find_item<C: ConnectionTrait>(
    conn: &C,
    item_id: ReconciliationItemId,
) -> Result<reconciliation_items::Model, ReconciliationError> {
    reconciliation_items::Entity::find_by_id(item_id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| ReconciliationError::NotFound(item_id.to_string()))
}

fn item_status(matched: &ItemMatch) -> ItemStatus {
    if matched.is_matched() {
        ItemStatus::Matched
    } else {
        ItemStatus::Unmatched
    }
}

fn to_i32(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn to_u32(count: i32) -> u32 {
    u32::try_from(count).unwrap_or_default()
}

fn summary_of(model: &reconciliations::Model) -> ReconciliationSummary {
    ReconciliationSummary {
        source_balance: Cents(model.source_balance),
        ledger_balance: Cents(model.ledger_balance),
        variance: Cents(model.variance),
        total_items: to_u32(model.total_items),
        matched_count: to_u32(model.matched_count),
        unmatched_count: to_u32(model.unmatched_count),
        manual_matched_count: to_u32(model.manual_matched_count),
        status: ReconciliationStatus::from(model.status),
    }
}

fn item_to_domain(model: reconciliation_items::Model) -> ReconciliationItem {
    ReconciliationItem {
        id: ReconciliationItemId::from_uuid(model.id),
        source_reference: model.source_reference,
        source_amount: Cents(model.source_amount),
        source_date: model.source_date,
        matched_transaction_id: model.matched_transaction_id,
        matched_journal_entry_id: model.matched_journal_entry_id.map(JournalEntryId::from_uuid),
        ledger_amount: model.ledger_amount.map(Cents),
        match_type: model.match_type.into(),
        match_confidence: u8::try_from(model.match_confidence).unwrap_or_default(),
        status: model.status.into(),
        resolved_by: model.resolved_by.map(ActorId::from_uuid),
        resolution_notes: model.resolution_notes,
        resolved_at: model.resolved_at.map(|t| t.with_timezone(&Utc)),
    }
}
