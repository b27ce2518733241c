//! Data sources the jobs read from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use premia_core::commission::{CommissionPolicy, RiderPremium};
use premia_core::ledger::{EntryType, codes};
use premia_core::posting::PostingPolicy;
use premia_core::reconciliation::StatementItem;
use premia_core::settlement::SettlementPeriod;
use premia_shared::types::Cents;
use serde::Deserialize;
use uuid::Uuid;

use crate::repositories::{JournalError, JournalRepository};

/// Errors raised while loading job input.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source was not valid JSON of the expected shape.
    #[error("Malformed input: {0}")]
    Parse(#[from] serde_json::Error),

    /// A ledger query failed.
    #[error(transparent)]
    Journal(#[from] JournalError),
}

/// Supplies the external statement for a day.
#[async_trait]
pub trait StatementProvider: Send + Sync {
    /// Statement source name stored on the reconciliation.
    fn source_name(&self) -> &str;

    /// Statement items for `date`, in statement order.
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<StatementItem>, ProviderError>;
}

/// Supplies per-rider premium totals for a commission period.
#[async_trait]
pub trait PremiumDataProvider: Send + Sync {
    /// Premium totals and full-term flags for riders active in `period`.
    async fn fetch(&self, period: SettlementPeriod) -> Result<Vec<RiderPremium>, ProviderError>;
}

/// Row of a statement file.
#[derive(Debug, Deserialize)]
struct StatementRow {
    reference: String,
    amount_cents: i64,
    #[serde(default)]
    date: Option<NaiveDate>,
}

/// Reads `<dir>/<YYYY-MM-DD>.json`, a JSON array of
/// `{ "reference", "amount_cents", "date"? }` rows. A missing file is an
/// empty statement.
#[derive(Debug, Clone)]
pub struct JsonStatementProvider {
    source_name: String,
    dir: PathBuf,
}

impl JsonStatementProvider {
    /// Creates a provider over `dir`.
    #[must_use]
    pub fn new(source_name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            source_name: source_name.into(),
            dir: dir.into(),
        }
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }
}

#[async_trait]
impl StatementProvider for JsonStatementProvider {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn fetch(&self, date: NaiveDate) -> Result<Vec<StatementItem>, ProviderError> {
        let path = self.path_for(date);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No statement file");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        let rows: Vec<StatementRow> = serde_json::from_str(&raw)?;
        Ok(rows
            .into_iter()
            .map(|r| StatementItem {
                reference: r.reference,
                amount: Cents(r.amount_cents),
                date: r.date.unwrap_or(date),
            })
            .collect())
    }
}

/// Derives rider premium data from posted receipt entries.
///
/// A rider's premium is what their receipts dated in the period credited to
/// premium payable. Covered days are one per day-1 deposit plus, for daily
/// payments, the platform fee credited divided by the per-day platform fee.
/// Days accumulate over every receipt up to the period end, and a rider
/// counts as full-term only in the period where the running total first
/// reaches the threshold.
#[derive(Debug, Clone)]
pub struct LedgerPremiumProvider {
    journal: JournalRepository,
    posting: PostingPolicy,
    commission: CommissionPolicy,
}

impl LedgerPremiumProvider {
    /// Creates a provider over the journal.
    #[must_use]
    pub const fn new(
        journal: JournalRepository,
        posting: PostingPolicy,
        commission: CommissionPolicy,
    ) -> Self {
        Self {
            journal,
            posting,
            commission,
        }
    }

    fn days_covered(&self, entry_type: EntryType, platform_fee: Cents) -> u32 {
        match entry_type {
            EntryType::PaymentReceiptDay1 => 1,
            _ if self.posting.daily_platform_fee.is_positive() => {
                u32::try_from(platform_fee.get() / self.posting.daily_platform_fee.get())
                    .unwrap_or(u32::MAX)
            }
            _ => 0,
        }
    }
}

#[async_trait]
impl PremiumDataProvider for LedgerPremiumProvider {
    async fn fetch(&self, period: SettlementPeriod) -> Result<Vec<RiderPremium>, ProviderError> {
        let receipts = self
            .journal
            .get_posted_by_types_through(
                &[EntryType::PaymentReceiptDay1, EntryType::PaymentReceiptDaily],
                period.end,
            )
            .await?;

        let mut per_rider: BTreeMap<Uuid, RiderTally> = BTreeMap::new();
        for entry in &receipts {
            let Some(rider_id) = entry.rider_id else {
                continue;
            };
            let days = self.days_covered(
                entry.entry_type,
                entry.credited_to(codes::PLATFORM_SERVICE_FEE_INCOME),
            );
            let tally = per_rider.entry(rider_id).or_default();
            if entry.entry_date < period.start {
                tally.days_before = tally.days_before.saturating_add(days);
            } else {
                tally.active = true;
                tally.premium += entry.credited_to(codes::PREMIUM_PAYABLE);
            }
            tally.days_through = tally.days_through.saturating_add(days);
        }

        Ok(per_rider
            .into_iter()
            .filter(|(_, tally)| tally.active)
            .map(|(rider_id, tally)| RiderPremium {
                rider_id,
                total_premium: tally.premium,
                full_term_completed: self.commission.is_full_term(tally.days_through)
                    && !self.commission.is_full_term(tally.days_before),
            })
            .collect())
    }
}

#[derive(Debug, Default)]
struct RiderTally {
    premium: Cents,
    days_before: u32,
    days_through: u32,
    active: bool,
}
