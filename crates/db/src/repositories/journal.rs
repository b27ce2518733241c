//! Journal entry store.
//!
//! Entries, their lines and the resulting balance updates are written in one
//! database transaction. Posted entries are never edited; corrections are
//! new reversing entries.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use premia_core::ledger::{
    EntryDraft, EntryStatus, EntryType, JournalEntry, JournalLine, LedgerError, NumberKind,
    numbering, validate_lines,
};
use premia_shared::types::{Cents, GlAccountId, JournalEntryId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use super::gl_account::{GlAccountError, GlAccountRepository, is_unique_violation};
use crate::entities::{
    gl_accounts, journal_entries, journal_entry_lines, sea_orm_active_enums as stored,
};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    NotFound(String),

    /// An entry already exists for the source transaction.
    #[error("Source transaction {source_transaction_id} already posted as {existing}")]
    DuplicateSource {
        /// Source transaction ID.
        source_transaction_id: String,
        /// The entry that owns it.
        existing: JournalEntryId,
    },

    /// Another writer took the generated entry number.
    #[error("Entry number {0} already taken")]
    NumberCollision(String),

    /// The entry is not in the state the operation requires.
    #[error("Journal entry {id} is {status}")]
    InvalidStatus {
        /// Entry ID.
        id: JournalEntryId,
        /// Current status.
        status: EntryStatus,
    },

    /// Line validation or account lookup failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Balance update failed.
    #[error(transparent)]
    Account(#[from] GlAccountError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl JournalError {
    /// Returns the error code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateSource { .. } => "ALREADY_POSTED",
            Self::NumberCollision(_) => "NUMBER_COLLISION",
            Self::InvalidStatus { .. } => "INVALID_STATE_TRANSITION",
            Self::Ledger(e) => e.error_code(),
            Self::Account(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and stores an entry.
    ///
    /// With `auto_post` the entry is stored as Posted and every line is
    /// applied to its account in the same transaction; otherwise it is
    /// stored as Draft and balances are untouched.
    ///
    /// # Errors
    ///
    /// - `Ledger` for unbalanced lines or unknown/inactive accounts
    /// - `DuplicateSource` if the source transaction already has an entry
    /// - `NumberCollision` if a concurrent writer took the entry number
    pub async fn create(
        &self,
        draft: &EntryDraft,
        auto_post: bool,
    ) -> Result<JournalEntry, JournalError> {
        validate_lines(&draft.lines)?;

        let txn = self.db.begin().await?;
        match Self::write_entry(&txn, draft, auto_post).await {
            Ok(entry) => {
                txn.commit().await?;
                tracing::info!(
                    entry_number = %entry.entry_number,
                    entry_type = %entry.entry_type,
                    source_transaction_id = %entry.source_transaction_id,
                    posted = auto_post,
                    "Journal entry created"
                );
                Ok(entry)
            }
            Err(JournalError::Database(err)) if is_unique_violation(&err) => {
                txn.rollback().await?;
                Err(self.classify_conflict(&draft.source_transaction_id).await)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    /// Posts a draft entry, applying its lines to account balances.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `InvalidStatus` unless the entry is a Draft.
    pub async fn post_entry(&self, id: JournalEntryId) -> Result<JournalEntry, JournalError> {
        let txn = self.db.begin().await?;
        let model = journal_entries::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;

        if model.status != stored::EntryStatus::Draft {
            return Err(JournalError::InvalidStatus {
                id,
                status: model.status.into(),
            });
        }

        let lines = load_lines(&txn, &[model.id]).await?;
        let updates = lock_order(lines.get(&model.id).into_iter().flatten().map(|line| {
            (
                GlAccountId::from_uuid(line.account_id),
                line.account_code.as_str(),
                Cents(line.debit),
                Cents(line.credit),
            )
        }));
        apply_balances(&txn, updates).await?;

        let mut active: journal_entries::ActiveModel = model.into();
        active.status = Set(stored::EntryStatus::Posted);
        active.posted_at = Set(Some(Utc::now().into()));
        let updated = active.update(&txn).await?;
        let entry = assemble(&txn, updated).await?;
        txn.commit().await?;

        tracing::info!(entry_number = %entry.entry_number, "Draft journal entry posted");
        Ok(entry)
    }

    /// Stores a reversing entry and marks the original Reversed, atomically.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidStatus` unless the original is Posted, plus the
    /// errors of [`Self::create`].
    pub async fn create_reversal(
        &self,
        original_id: JournalEntryId,
        reversal: &EntryDraft,
        reason: &str,
    ) -> Result<JournalEntry, JournalError> {
        validate_lines(&reversal.lines)?;

        let txn = self.db.begin().await?;
        let result = async {
            let original = journal_entries::Entity::find_by_id(original_id.into_inner())
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| JournalError::NotFound(original_id.to_string()))?;

            if original.status != stored::EntryStatus::Posted {
                return Err(JournalError::InvalidStatus {
                    id: original_id,
                    status: original.status.into(),
                });
            }

            let entry = Self::write_entry(&txn, reversal, true).await?;

            let mut active: journal_entries::ActiveModel = original.into();
            active.status = Set(stored::EntryStatus::Reversed);
            active.reversed_by = Set(Some(entry.id.into_inner()));
            active.reversal_reason = Set(Some(reason.to_string()));
            active.update(&txn).await?;
            Ok(entry)
        }
        .await;

        match result {
            Ok(entry) => {
                txn.commit().await?;
                tracing::info!(
                    original = %original_id,
                    reversal = %entry.entry_number,
                    "Journal entry reversed"
                );
                Ok(entry)
            }
            Err(JournalError::Database(err)) if is_unique_violation(&err) => {
                txn.rollback().await?;
                Err(self.classify_conflict(&reversal.source_transaction_id).await)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    /// Looks up an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID.
    pub async fn get_by_id(&self, id: JournalEntryId) -> Result<JournalEntry, JournalError> {
        let model = journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        assemble(&self.db, model).await
    }

    /// Looks up the entry recorded for a source transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_source_transaction_id(
        &self,
        source_transaction_id: &str,
    ) -> Result<Option<JournalEntry>, JournalError> {
        let model = journal_entries::Entity::find()
            .filter(journal_entries::Column::SourceTransactionId.eq(source_transaction_id))
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(Some(assemble(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    /// Returns entries dated within `[start, end]`, ordered by date and number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let models = journal_entries::Entity::find()
            .filter(journal_entries::Column::EntryDate.gte(start))
            .filter(journal_entries::Column::EntryDate.lte(end))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::EntryNumber)
            .all(&self.db)
            .await?;
        assemble_all(&self.db, models).await
    }

    /// Returns Posted entries of the given types dated within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_posted_by_types(
        &self,
        types: &[EntryType],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let models = posted_of_types(types)
            .filter(journal_entries::Column::EntryDate.gte(start))
            .filter(journal_entries::Column::EntryDate.lte(end))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::EntryNumber)
            .all(&self.db)
            .await?;
        assemble_all(&self.db, models).await
    }

    /// Posted entries of the given types dated on or before `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_posted_by_types_through(
        &self,
        types: &[EntryType],
        end: NaiveDate,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let models = posted_of_types(types)
            .filter(journal_entries::Column::EntryDate.lte(end))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::EntryNumber)
            .all(&self.db)
            .await?;
        assemble_all(&self.db, models).await
    }

    /// Decides why an insert hit a unique index once the transaction is gone.
    async fn classify_conflict(&self, source_transaction_id: &str) -> JournalError {
        let existing = journal_entries::Entity::find()
            .filter(journal_entries::Column::SourceTransactionId.eq(source_transaction_id))
            .one(&self.db)
            .await;
        match existing {
            Ok(Some(model)) => JournalError::DuplicateSource {
                source_transaction_id: source_transaction_id.to_string(),
                existing: JournalEntryId::from_uuid(model.id),
            },
            Ok(None) => JournalError::NumberCollision(source_transaction_id.to_string()),
            Err(err) => JournalError::Database(err),
        }
    }

    /// Inserts the entry, its lines, and (if posting) the balance updates.
    async fn write_entry(
        txn: &DatabaseTransaction,
        draft: &EntryDraft,
        post: bool,
    ) -> Result<JournalEntry, JournalError> {
        let existing = journal_entries::Entity::find()
            .filter(journal_entries::Column::SourceTransactionId.eq(&draft.source_transaction_id))
            .one(txn)
            .await?;
        if let Some(existing) = existing {
            return Err(JournalError::DuplicateSource {
                source_transaction_id: draft.source_transaction_id.clone(),
                existing: JournalEntryId::from_uuid(existing.id),
            });
        }

        // Resolve accounts up front so nothing is written for a bad code.
        let mut accounts: HashMap<&str, gl_accounts::Model> = HashMap::new();
        for line in &draft.lines {
            if accounts.contains_key(line.account_code.as_str()) {
                continue;
            }
            let account = gl_accounts::Entity::find()
                .filter(gl_accounts::Column::Code.eq(&line.account_code))
                .one(txn)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(line.account_code.clone()))?;
            if account.status == stored::AccountStatus::Inactive {
                return Err(LedgerError::AccountInactive(account.code).into());
            }
            accounts.insert(line.account_code.as_str(), account);
        }

        let entry_number = next_entry_number(txn, draft.entry_date).await?;
        let now = Utc::now().into();
        let entry_id = JournalEntryId::new();

        let entry = journal_entries::ActiveModel {
            id: Set(entry_id.into_inner()),
            entry_number: Set(entry_number),
            entry_type: Set(draft.entry_type.into()),
            entry_date: Set(draft.entry_date),
            status: Set(if post {
                stored::EntryStatus::Posted
            } else {
                stored::EntryStatus::Draft
            }),
            source_transaction_id: Set(draft.source_transaction_id.clone()),
            rider_id: Set(draft.rider_id),
            description: Set(draft.description.clone()),
            reversed_by: Set(None),
            reversal_reason: Set(None),
            posted_at: Set(post.then_some(now)),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;

        let mut lines = Vec::with_capacity(draft.lines.len());
        for (index, line) in draft.lines.iter().enumerate() {
            let account = &accounts[line.account_code.as_str()];
            let line_number = i32::try_from(index + 1).unwrap_or(i32::MAX);
            journal_entry_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                journal_entry_id: Set(entry.id),
                line_number: Set(line_number),
                account_id: Set(account.id),
                account_code: Set(account.code.clone()),
                debit: Set(line.debit.get()),
                credit: Set(line.credit.get()),
                description: Set(line.description.clone()),
            }
            .insert(txn)
            .await?;

            lines.push(JournalLine {
                account_id: GlAccountId::from_uuid(account.id),
                account_code: account.code.clone(),
                debit: line.debit,
                credit: line.credit,
                description: line.description.clone(),
            });
        }

        if post {
            let updates = lock_order(
                lines
                    .iter()
                    .map(|l| (l.account_id, l.account_code.as_str(), l.debit, l.credit)),
            );
            apply_balances(txn, updates).await?;
        }

        Ok(JournalEntry {
            id: entry_id,
            entry_number: entry.entry_number,
            entry_type: entry.entry_type.into(),
            entry_date: entry.entry_date,
            status: entry.status.into(),
            source_transaction_id: entry.source_transaction_id,
            rider_id: entry.rider_id,
            description: entry.description,
            lines,
        })
    }
}

/// Per-account balance updates sorted by account code, with repeated
/// accounts merged. Every writer locks accounts in this order.
fn lock_order<'a>(
    lines: impl IntoIterator<Item = (GlAccountId, &'a str, Cents, Cents)>,
) -> Vec<(GlAccountId, Cents, Cents)> {
    let mut merged: BTreeMap<&str, (GlAccountId, Cents, Cents)> = BTreeMap::new();
    for (account_id, code, debit, credit) in lines {
        let slot = merged
            .entry(code)
            .or_insert((account_id, Cents::ZERO, Cents::ZERO));
        slot.1 += debit;
        slot.2 += credit;
    }
    merged.into_values().collect()
}

async fn apply_balances(
    txn: &DatabaseTransaction,
    updates: Vec<(GlAccountId, Cents, Cents)>,
) -> Result<(), JournalError> {
    for (account_id, debit, credit) in updates {
        GlAccountRepository::apply_in(txn, account_id, debit, credit).await?;
    }
    Ok(())
}

fn posted_of_types(types: &[EntryType]) -> Select<journal_entries::Entity> {
    let stored_types: Vec<stored::EntryType> = types.iter().map(|t| (*t).into()).collect();
    journal_entries::Entity::find()
        .filter(journal_entries::Column::EntryType.is_in(stored_types))
        .filter(journal_entries::Column::Status.eq(stored::EntryStatus::Posted))
}

/// Next `JE-YYYYMMDD-NNNN` number, counted inside the writing transaction.
async fn next_entry_number<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
) -> Result<String, DbErr> {
    let prefix = numbering::day_prefix(NumberKind::JournalEntry, date);
    let existing = journal_entries::Entity::find()
        .filter(journal_entries::Column::EntryNumber.starts_with(&prefix))
        .count(conn)
        .await?;
    Ok(numbering::next_number(NumberKind::JournalEntry, date, existing))
}

/// Loads lines for the given entries, grouped by entry and in line order.
pub(crate) async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    entry_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<journal_entry_lines::Model>>, DbErr> {
    let mut grouped: HashMap<Uuid, Vec<journal_entry_lines::Model>> = HashMap::new();
    if entry_ids.is_empty() {
        return Ok(grouped);
    }
    let lines = journal_entry_lines::Entity::find()
        .filter(journal_entry_lines::Column::JournalEntryId.is_in(entry_ids.iter().copied()))
        .order_by_asc(journal_entry_lines::Column::JournalEntryId)
        .order_by_asc(journal_entry_lines::Column::LineNumber)
        .all(conn)
        .await?;
    for line in lines {
        grouped.entry(line.journal_entry_id).or_default().push(line);
    }
    Ok(grouped)
}

fn to_domain(model: journal_entries::Model, lines: Vec<journal_entry_lines::Model>) -> JournalEntry {
    JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        entry_number: model.entry_number,
        entry_type: model.entry_type.into(),
        entry_date: model.entry_date,
        status: model.status.into(),
        source_transaction_id: model.source_transaction_id,
        rider_id: model.rider_id,
        description: model.description,
        lines: lines
            .into_iter()
            .map(|l| JournalLine {
                account_id: GlAccountId::from_uuid(l.account_id),
                account_code: l.account_code,
                debit: Cents(l.debit),
                credit: Cents(l.credit),
                description: l.description,
            })
            .collect(),
    }
}

async fn assemble<C: ConnectionTrait>(
    conn: &C,
    model: journal_entries::Model,
) -> Result<JournalEntry, JournalError> {
    let mut lines = load_lines(conn, &[model.id]).await?;
    let own = lines.remove(&model.id).unwrap_or_default();
    Ok(to_domain(model, own))
}

async fn assemble_all<C: ConnectionTrait>(
    conn: &C,
    models: Vec<journal_entries::Model>,
) -> Result<Vec<JournalEntry>, JournalError> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut lines = load_lines(conn, &ids).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let own = lines.remove(&m.id).unwrap_or_default();
            to_domain(m, own)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_independent_of_line_order() {
        let escrow = GlAccountId::new();
        let premium = GlAccountId::new();
        let kba = GlAccountId::new();

        // Receipt order: escrow first, payable last.
        let receipt = lock_order([
            (escrow, "1010", Cents(8_700), Cents::ZERO),
            (kba, "2030", Cents::ZERO, Cents(100)),
            (premium, "2010", Cents::ZERO, Cents(8_600)),
        ]);
        // Remittance order: payable first, escrow last.
        let remittance = lock_order([
            (premium, "2010", Cents(8_600), Cents::ZERO),
            (escrow, "1010", Cents::ZERO, Cents(8_600)),
        ]);

        let ids = |u: &[(GlAccountId, Cents, Cents)]| u.iter().map(|x| x.0).collect::<Vec<_>>();
        assert_eq!(ids(&receipt), vec![escrow, premium, kba]);
        assert_eq!(ids(&remittance), vec![escrow, premium]);
    }

    #[test]
    fn test_lock_order_merges_repeated_accounts() {
        let escrow = GlAccountId::new();
        let fees = GlAccountId::new();

        let updates = lock_order([
            (escrow, "1010", Cents(500), Cents::ZERO),
            (fees, "4010", Cents::ZERO, Cents(500)),
            (escrow, "1010", Cents::ZERO, Cents(200)),
        ]);

        assert_eq!(
            updates,
            vec![
                (escrow, Cents(500), Cents(200)),
                (fees, Cents::ZERO, Cents(500)),
            ]
        );
    }
}
