//! Business events accepted by the posting engine and its result shape.

use chrono::NaiveDate;
use premia_shared::types::{Cents, JournalEntryId, SettlementId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settlement::{PartnerType, SettlementType};

/// Which premium receipt rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReceiptKind {
    /// First deposit opening cover.
    DayOne,
    /// Daily payment covering `days` unpaid days.
    Daily {
        /// Number of days covered (at least 1).
        days: u32,
    },
}

/// Mobile money premium receipt from a rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Payment transaction id (idempotency key).
    pub source_transaction_id: String,
    /// Paying rider.
    pub rider_id: Option<Uuid>,
    /// Amount received.
    pub amount: Cents,
    /// Date received.
    pub date: NaiveDate,
    /// Deposit or daily payment.
    pub kind: ReceiptKind,
}

/// Refund approved for a rider, net of a processing fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundInitiation {
    /// Refund id (idempotency key).
    pub source_transaction_id: String,
    /// Rider refunded.
    pub rider_id: Option<Uuid>,
    /// Amount owed to the rider.
    pub amount: Cents,
    /// Processing fee kept by the platform.
    pub fee: Cents,
    /// Date approved.
    pub date: NaiveDate,
}

/// Refund paid out to a rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPayout {
    /// Payout transaction id (idempotency key).
    pub source_transaction_id: String,
    /// Rider paid.
    pub rider_id: Option<Uuid>,
    /// Amount paid.
    pub amount: Cents,
    /// Date paid.
    pub date: NaiveDate,
}

/// Premium forwarded to the underwriter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRemittance {
    /// Remittance id (idempotency key).
    pub source_transaction_id: String,
    /// Amount remitted.
    pub amount: Cents,
    /// Date remitted.
    pub date: NaiveDate,
}

/// Service fees moved out of escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFeeDistribution {
    /// Distribution batch id (idempotency key).
    pub source_transaction_id: String,
    /// Platform share moved to the operating bank.
    pub platform: Cents,
    /// KBA share cleared from its payable.
    pub kba: Cents,
    /// ROBS share cleared from its payable.
    pub robs: Cents,
    /// Date distributed.
    pub date: NaiveDate,
}

/// Commission received from the underwriter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionReceipt {
    /// Receipt id (idempotency key).
    pub source_transaction_id: String,
    /// Amount received.
    pub amount: Cents,
    /// Date received.
    pub date: NaiveDate,
}

/// Settlement facts needed to post its GL side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPosting {
    /// Settlement id.
    pub settlement_id: SettlementId,
    /// Settlement number for descriptions.
    pub settlement_number: String,
    /// Partner paid.
    pub partner: PartnerType,
    /// Service fee or commission.
    pub settlement_type: SettlementType,
    /// Amount.
    pub amount: Cents,
    /// Accounting date.
    pub date: NaiveDate,
}

/// Outcome of a posting call. Never an error past the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingResult {
    /// Whether the event is reflected in the ledger.
    pub success: bool,
    /// Entry recorded for the event.
    pub journal_entry_id: Option<JournalEntryId>,
    /// Entry existed before this call.
    pub already_posted: bool,
    /// Failure description.
    pub message: Option<String>,
}

impl PostingResult {
    /// A new entry was posted.
    #[must_use]
    pub const fn posted(id: JournalEntryId) -> Self {
        Self {
            success: true,
            journal_entry_id: Some(id),
            already_posted: false,
            message: None,
        }
    }

    /// The event had already been posted.
    #[must_use]
    pub const fn already_posted(id: JournalEntryId) -> Self {
        Self {
            success: true,
            journal_entry_id: Some(id),
            already_posted: true,
            message: None,
        }
    }

    /// The event could not be posted.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            journal_entry_id: None,
            already_posted: false,
            message: Some(message.into()),
        }
    }
}

/// Idempotency key for a settlement's commission accrual.
#[must_use]
pub fn accrual_source_id(settlement_id: SettlementId) -> String {
    format!("settlement:{settlement_id}:accrual")
}

/// Idempotency key for a settlement's payout.
#[must_use]
pub fn payout_source_id(settlement_id: SettlementId) -> String {
    format!("settlement:{settlement_id}:payout")
}

/// Idempotency key for the reversal of an entry.
#[must_use]
pub fn reversal_source_id(entry_id: JournalEntryId) -> String {
    format!("reversal:{entry_id}")
}
