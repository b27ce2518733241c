//! Partner settlement lifecycle.
//!
//! - `types` - Partner, settlement type, status, and transition actions
//! - `error` - Settlement-specific error types
//! - `workflow` - Guarded state transitions

pub mod error;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod workflow_props;

pub use error::SettlementError;
pub use types::{
    PartnerType, Settlement, SettlementAction, SettlementNotice, SettlementPeriod,
    SettlementStatus, SettlementType,
};
pub use workflow::SettlementWorkflow;
