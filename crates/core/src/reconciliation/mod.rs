//! Statement reconciliation: tiered auto-matching and summaries.

pub mod matcher;
pub mod types;

#[cfg(test)]
mod matcher_props;

pub use matcher::{Matcher, longest_common_substring, normalize_reference};
pub use types::{
    ItemMatch, ItemStatus, LedgerTransaction, MatchPolicy, MatchType, Reconciliation,
    ReconciliationItem, ReconciliationStatus, ReconciliationSummary, ReconciliationType,
    StatementItem,
};
