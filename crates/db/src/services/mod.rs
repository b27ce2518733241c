//! Ledger services built on the repositories.
//!
//! - `posting` - idempotent event posting
//! - `settlement` - partner settlement lifecycle and its postings
//! - `reconciliation` - statement matching
//! - `notifier` - settlement notification seam

pub mod notifier;
pub mod posting;
pub mod reconciliation;
pub mod settlement;

pub use notifier::{LoggingNotifier, NotifyError, SettlementNotifier};
pub use posting::PostingEngine;
pub use reconciliation::{ReconciliationError, ReconciliationService};
pub use settlement::{
    GenerationOutcome, SettlementFilter, SettlementService, SettlementServiceError,
    TransitionOutcome,
};
