//! Posting engine: turns business events into posted journal entries.
//!
//! Every call is at most once per `source_transaction_id`. The unique index
//! on that column is the guard; the lookup before building only skips work.
//! Errors never cross this boundary, they come back as a failed
//! [`PostingResult`].

use chrono::Utc;
use premia_core::ledger::{EntryDraft, EntryStatus};
use premia_core::posting::{
    CommissionReceipt, PaymentReceipt, PostingError, PostingPolicy, PostingResult, PostingRules,
    PremiumRemittance, RefundInitiation, RefundPayout, ServiceFeeDistribution, SettlementPosting,
    accrual_source_id, payout_source_id, reversal_source_id,
};
use premia_shared::types::JournalEntryId;
use sea_orm::DatabaseConnection;

use crate::repositories::{JournalError, JournalRepository};

/// Attempts per event when a concurrent writer takes the entry number.
const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Posting engine service.
#[derive(Debug, Clone)]
pub struct PostingEngine {
    journal: JournalRepository,
    rules: PostingRules,
}

impl PostingEngine {
    /// Creates a posting engine over `db` with the given fee table.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: PostingPolicy) -> Self {
        Self {
            journal: JournalRepository::new(db),
            rules: PostingRules::new(policy),
        }
    }

    /// The allocation rules in use.
    #[must_use]
    pub const fn rules(&self) -> &PostingRules {
        &self.rules
    }

    /// The journal the engine writes to.
    #[must_use]
    pub const fn journal(&self) -> &JournalRepository {
        &self.journal
    }

    /// Posts a day-1 deposit or a daily premium payment.
    pub async fn post_payment_receipt(&self, event: &PaymentReceipt) -> PostingResult {
        self.post(&event.source_transaction_id, || {
            self.rules.payment_receipt(event)
        })
        .await
    }

    /// Posts an approved refund.
    pub async fn post_refund(&self, event: &RefundInitiation) -> PostingResult {
        self.post(&event.source_transaction_id, || {
            self.rules.refund_initiation(event)
        })
        .await
    }

    /// Posts the cash-out of a refund.
    pub async fn post_refund_payout(&self, event: &RefundPayout) -> PostingResult {
        self.post(&event.source_transaction_id, || self.rules.refund_payout(event))
            .await
    }

    /// Posts a premium remittance to the underwriter.
    pub async fn post_remittance(&self, event: &PremiumRemittance) -> PostingResult {
        self.post(&event.source_transaction_id, || {
            self.rules.premium_remittance(event)
        })
        .await
    }

    /// Posts a service fee distribution out of escrow.
    pub async fn post_service_fee_distribution(
        &self,
        event: &ServiceFeeDistribution,
    ) -> PostingResult {
        self.post(&event.source_transaction_id, || {
            self.rules.service_fee_distribution(event)
        })
        .await
    }

    /// Posts commission received from the underwriter.
    pub async fn post_commission_receipt(&self, event: &CommissionReceipt) -> PostingResult {
        self.post(&event.source_transaction_id, || {
            self.rules.commission_receipt(event)
        })
        .await
    }

    /// Posts the partner commission accrual of an approved settlement.
    pub async fn post_commission_accrual(&self, settlement: &SettlementPosting) -> PostingResult {
        let source = accrual_source_id(settlement.settlement_id);
        self.post(&source, || self.rules.commission_accrual(settlement))
            .await
    }

    /// Posts the payout of a completed settlement.
    pub async fn post_settlement_payout(&self, settlement: &SettlementPosting) -> PostingResult {
        let source = payout_source_id(settlement.settlement_id);
        self.post(&source, || self.rules.settlement_payout(settlement))
            .await
    }

    /// Reverses a posted entry, dated today.
    ///
    /// Reversing an entry that is already reversed returns the existing
    /// reversal as `already_posted`.
    pub async fn reverse_entry(&self, entry_id: JournalEntryId, reason: &str) -> PostingResult {
        let source = reversal_source_id(entry_id);
        match self.journal.get_by_source_transaction_id(&source).await {
            Ok(Some(existing)) => return already(&source, existing.id),
            Ok(None) => {}
            Err(err) => return failed(&source, &err),
        }

        if reason.trim().is_empty() {
            return PostingResult::failed("Reversal reason is required");
        }

        let original = match self.journal.get_by_id(entry_id).await {
            Ok(entry) => entry,
            Err(err) => return failed(&source, &err),
        };
        let draft = match self
            .rules
            .reversal(&original, reason, Utc::now().date_naive())
        {
            Ok(draft) => draft,
            Err(err) => return rejected(&source, &err),
        };

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            match self.journal.create_reversal(entry_id, &draft, reason).await {
                Ok(entry) => return PostingResult::posted(entry.id),
                Err(JournalError::DuplicateSource { existing, .. }) => {
                    return already(&source, existing);
                }
                Err(JournalError::NumberCollision(_)) => {}
                // Lost a race with a concurrent reversal of the same entry.
                Err(JournalError::InvalidStatus {
                    status: EntryStatus::Reversed,
                    ..
                }) => {
                    return match self.journal.get_by_source_transaction_id(&source).await {
                        Ok(Some(existing)) => already(&source, existing.id),
                        Ok(None) => PostingResult::failed(format!(
                            "Entry {entry_id} was reversed by another entry"
                        )),
                        Err(err) => failed(&source, &err),
                    };
                }
                Err(err) => return failed(&source, &err),
            }
        }
        exhausted(&source)
    }

    async fn post(
        &self,
        source: &str,
        build: impl FnOnce() -> Result<EntryDraft, PostingError>,
    ) -> PostingResult {
        match self.journal.get_by_source_transaction_id(source).await {
            Ok(Some(existing)) => return already(source, existing.id),
            Ok(None) => {}
            Err(err) => return failed(source, &err),
        }

        let draft = match build() {
            Ok(draft) => draft,
            Err(err) => return rejected(source, &err),
        };

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            match self.journal.create(&draft, true).await {
                Ok(entry) => return PostingResult::posted(entry.id),
                Err(JournalError::DuplicateSource { existing, .. }) => {
                    return already(source, existing);
                }
                Err(JournalError::NumberCollision(_)) => {
                    tracing::debug!(source_transaction_id = source, "Entry number taken, retrying");
                }
                Err(err) => return failed(source, &err),
            }
        }
        exhausted(source)
    }
}

fn already(source: &str, existing: JournalEntryId) -> PostingResult {
    tracing::info!(
        source_transaction_id = source,
        journal_entry_id = %existing,
        "Source transaction already posted"
    );
    PostingResult::already_posted(existing)
}

fn rejected(source: &str, err: &PostingError) -> PostingResult {
    tracing::warn!(
        source_transaction_id = source,
        error_code = err.error_code(),
        error = %err,
        "Posting rejected"
    );
    PostingResult::failed(err.to_string())
}

fn failed(source: &str, err: &JournalError) -> PostingResult {
    tracing::warn!(
        source_transaction_id = source,
        error_code = err.error_code(),
        error = %err,
        "Posting failed"
    );
    PostingResult::failed(err.to_string())
}

fn exhausted(source: &str) -> PostingResult {
    tracing::error!(
        source_transaction_id = source,
        attempts = MAX_NUMBER_ATTEMPTS,
        "Gave up allocating an entry number"
    );
    PostingResult::failed(format!(
        "Could not allocate an entry number after {MAX_NUMBER_ATTEMPTS} attempts"
    ))
}
