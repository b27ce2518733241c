//! Business event → journal entry translation.
//!
//! - `types` - Event inputs and the `PostingResult` returned to callers
//! - `rules` - The fixed allocation table
//! - `error` - Rule-level errors

pub mod error;
pub mod rules;
pub mod types;

#[cfg(test)]
mod rules_props;

pub use error::PostingError;
pub use rules::{PostingPolicy, PostingRules, ReceiptFees};
pub use types::{
    CommissionReceipt, PaymentReceipt, PostingResult, PremiumRemittance, ReceiptKind,
    RefundInitiation, RefundPayout, ServiceFeeDistribution, SettlementPosting, accrual_source_id,
    payout_source_id, reversal_source_id,
};
