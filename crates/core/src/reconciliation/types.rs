//! Reconciliation domain types.

use chrono::NaiveDate;
use premia_shared::config::ReconciliationConfig;
use chrono::{DateTime, Utc};
use premia_shared::types::{ActorId, Cents, JournalEntryId, ReconciliationId, ReconciliationItemId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a statement item was linked to a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Reference and amount equal.
    Exact,
    /// Amount equal, reference differs.
    AmountOnly,
    /// Reference equal or contained, amount differs.
    ReferenceOnly,
    /// Amount within tolerance and references overlap.
    Fuzzy,
    /// Linked by an operator.
    Manual,
    /// No counterpart found.
    None,
}

impl MatchType {
    /// Automatic tiers in precedence order.
    pub const AUTOMATIC_TIERS: [Self; 4] =
        [Self::Exact, Self::AmountOnly, Self::ReferenceOnly, Self::Fuzzy];

    /// Confidence score assigned to this match type.
    #[must_use]
    pub const fn confidence(self) -> u8 {
        match self {
            Self::Exact | Self::Manual => 100,
            Self::AmountOnly => 80,
            Self::ReferenceOnly => 70,
            Self::Fuzzy => 60,
            Self::None => 0,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::AmountOnly => "amount_only",
            Self::ReferenceOnly => "reference_only",
            Self::Fuzzy => "fuzzy",
            Self::Manual => "manual",
            Self::None => "none",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement item status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Linked to a ledger transaction.
    Matched,
    /// No ledger counterpart yet.
    Unmatched,
    /// Written off or explained without a link.
    Resolved,
}

/// Overall reconciliation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Every item matched.
    Matched,
    /// Some items matched.
    PartiallyMatched,
    /// No item matched.
    Unmatched,
}

impl ReconciliationStatus {
    /// Derives the status from item counts.
    #[must_use]
    pub const fn from_counts(matched: u32, unmatched: u32) -> Self {
        if unmatched == 0 {
            Self::Matched
        } else if matched == 0 {
            Self::Unmatched
        } else {
            Self::PartiallyMatched
        }
    }
}

/// Kind of reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationType {
    /// Daily mobile money settlement report against premium receipts.
    DailyMobileMoney,
}

impl ReconciliationType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyMobileMoney => "daily_mobile_money",
        }
    }
}

/// One line of an external statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementItem {
    /// Provider reference.
    pub reference: String,
    /// Amount settled.
    pub amount: Cents,
    /// Settlement date.
    pub date: NaiveDate,
}

/// A ledger-side transaction eligible for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Source transaction id of the receipt entry.
    pub transaction_id: String,
    /// Reference compared against statement references.
    pub reference: String,
    /// Entry total.
    pub amount: Cents,
    /// Entry date.
    pub date: NaiveDate,
    /// Backing journal entry.
    pub journal_entry_id: JournalEntryId,
}

/// Matching heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Maximum absolute amount difference for a fuzzy match.
    pub fuzzy_amount_tolerance: Cents,
    /// Minimum shared substring length for a fuzzy match.
    pub fuzzy_min_overlap: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::from(&ReconciliationConfig::default())
    }
}

impl From<&ReconciliationConfig> for MatchPolicy {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            fuzzy_amount_tolerance: Cents(config.fuzzy_amount_tolerance_cents),
            fuzzy_min_overlap: config.fuzzy_min_overlap,
        }
    }
}

/// Matching result for one statement item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMatch {
    /// Matched ledger transaction id.
    pub transaction_id: Option<String>,
    /// Matched ledger amount.
    pub ledger_amount: Option<Cents>,
    /// Tier that matched.
    pub match_type: MatchType,
    /// Confidence 0-100.
    pub confidence: u8,
}

impl ItemMatch {
    /// An unmatched item.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            transaction_id: None,
            ledger_amount: None,
            match_type: MatchType::None,
            confidence: 0,
        }
    }

    /// Returns true if a transaction was linked.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.transaction_id.is_some()
    }
}

/// Totals and counts of a matched statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Sum of statement amounts.
    pub source_balance: Cents,
    /// Sum of matched ledger amounts.
    pub ledger_balance: Cents,
    /// `source_balance - ledger_balance`.
    pub variance: Cents,
    /// Number of statement items.
    pub total_items: u32,
    /// Matched items.
    pub matched_count: u32,
    /// Unmatched items.
    pub unmatched_count: u32,
    /// Items matched manually.
    pub manual_matched_count: u32,
    /// Derived status.
    pub status: ReconciliationStatus,
}

impl ReconciliationSummary {
    /// Summarises items and their matches (zipped by position).
    #[must_use]
    pub fn compute(items: &[StatementItem], matches: &[ItemMatch]) -> Self {
        let source_balance: Cents = items.iter().map(|i| i.amount).sum();
        let ledger_balance: Cents = matches.iter().filter_map(|m| m.ledger_amount).sum();
        let matched_count = count_u32(matches.iter().filter(|m| m.is_matched()).count());
        let total_items = count_u32(items.len());
        let unmatched_count = total_items.saturating_sub(matched_count);
        let manual_matched_count = count_u32(
            matches
                .iter()
                .filter(|m| m.match_type == MatchType::Manual)
                .count(),
        );

        Self {
            source_balance,
            ledger_balance,
            variance: source_balance - ledger_balance,
            total_items,
            matched_count,
            unmatched_count,
            manual_matched_count,
            status: ReconciliationStatus::from_counts(matched_count, unmatched_count),
        }
    }

    /// Applies a manual match of `amount` to a previously unmatched item.
    #[must_use]
    pub fn with_manual_match(self, amount: Cents) -> Self {
        let matched_count = self.matched_count + 1;
        let unmatched_count = self.unmatched_count.saturating_sub(1);
        let ledger_balance = self.ledger_balance + amount;
        Self {
            ledger_balance,
            variance: self.source_balance - ledger_balance,
            matched_count,
            unmatched_count,
            manual_matched_count: self.manual_matched_count + 1,
            status: ReconciliationStatus::from_counts(matched_count, unmatched_count),
            ..self
        }
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Stored reconciliation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationItem {
    /// Item ID.
    pub id: ReconciliationItemId,
    /// Statement reference.
    pub source_reference: String,
    /// Statement amount.
    pub source_amount: Cents,
    /// Statement date.
    pub source_date: NaiveDate,
    /// Ledger transaction the item was matched to.
    pub matched_transaction_id: Option<String>,
    /// Entry behind the matched transaction.
    pub matched_journal_entry_id: Option<JournalEntryId>,
    /// Amount of the matched transaction.
    pub ledger_amount: Option<Cents>,
    /// How it was matched.
    pub match_type: MatchType,
    /// Match confidence, 0 to 100.
    pub match_confidence: u8,
    /// Item status.
    pub status: ItemStatus,
    /// Who resolved or manually matched the item.
    pub resolved_by: Option<ActorId>,
    /// Resolution or match note.
    pub resolution_notes: Option<String>,
    /// When it was resolved or manually matched.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Stored reconciliation run with its items in statement order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Reconciliation ID.
    pub id: ReconciliationId,
    /// Kind of reconciliation.
    pub reconciliation_type: ReconciliationType,
    /// Day reconciled.
    pub date: NaiveDate,
    /// Statement source (e.g. the mobile money provider).
    pub source_name: String,
    /// Balances, counts and status.
    pub summary: ReconciliationSummary,
    /// Who started the run.
    pub created_by: Option<ActorId>,
    /// Items.
    pub items: Vec<ReconciliationItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_scores() {
        assert_eq!(MatchType::Exact.confidence(), 100);
        assert_eq!(MatchType::AmountOnly.confidence(), 80);
        assert_eq!(MatchType::ReferenceOnly.confidence(), 70);
        assert_eq!(MatchType::Fuzzy.confidence(), 60);
        assert_eq!(MatchType::Manual.confidence(), 100);
        assert_eq!(MatchType::None.confidence(), 0);
    }

    #[test]
    fn test_status_from_counts() {
        assert_eq!(ReconciliationStatus::from_counts(3, 0), ReconciliationStatus::Matched);
        assert_eq!(ReconciliationStatus::from_counts(0, 3), ReconciliationStatus::Unmatched);
        assert_eq!(
            ReconciliationStatus::from_counts(2, 1),
            ReconciliationStatus::PartiallyMatched
        );
    }

    #[test]
    fn test_manual_match_updates_counts() {
        let summary = ReconciliationSummary {
            source_balance: Cents(30_000),
            ledger_balance: Cents(20_000),
            variance: Cents(10_000),
            total_items: 3,
            matched_count: 2,
            unmatched_count: 1,
            manual_matched_count: 0,
            status: ReconciliationStatus::PartiallyMatched,
        };
        let after = summary.with_manual_match(Cents(10_000));
        assert_eq!(after.matched_count, 3);
        assert_eq!(after.unmatched_count, 0);
        assert_eq!(after.manual_matched_count, 1);
        assert_eq!(after.variance, Cents::ZERO);
        assert_eq!(after.status, ReconciliationStatus::Matched);
    }
}
