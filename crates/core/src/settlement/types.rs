//! Settlement domain types.

use chrono::{DateTime, NaiveDate, Utc};
use premia_shared::types::{ActorId, Cents, JournalEntryId, SettlementId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::codes;

/// External party a settlement is owed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    /// KBA, the riders' association.
    Kba,
    /// ROBS, the operator cooperative.
    Robs,
}

impl PartnerType {
    /// All partners.
    pub const ALL: [Self; 2] = [Self::Kba, Self::Robs];

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kba => "kba",
            Self::Robs => "robs",
        }
    }

    /// Parses a partner from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kba" => Some(Self::Kba),
            "robs" => Some(Self::Robs),
            _ => None,
        }
    }

    /// Liability account holding service fees owed to this partner.
    #[must_use]
    pub const fn service_fee_payable_code(self) -> &'static str {
        match self {
            Self::Kba => codes::KBA_SERVICE_FEE_PAYABLE,
            Self::Robs => codes::ROBS_SERVICE_FEE_PAYABLE,
        }
    }

    /// Liability account holding commission owed to this partner.
    #[must_use]
    pub const fn commission_payable_code(self) -> &'static str {
        match self {
            Self::Kba => codes::KBA_COMMISSION_PAYABLE,
            Self::Robs => codes::ROBS_COMMISSION_PAYABLE,
        }
    }

    /// Payable account for the given settlement type.
    #[must_use]
    pub const fn payable_code(self, settlement_type: SettlementType) -> &'static str {
        match settlement_type {
            SettlementType::ServiceFee => self.service_fee_payable_code(),
            SettlementType::Commission => self.commission_payable_code(),
        }
    }
}

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a settlement pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementType {
    /// Accumulated per-rider service fees.
    ServiceFee,
    /// Partner share of underwriter commission.
    Commission,
}

impl SettlementType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceFee => "service_fee",
            Self::Commission => "commission",
        }
    }

    /// Parses a settlement type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "service_fee" => Some(Self::ServiceFee),
            "commission" => Some(Self::Commission),
            _ => None,
        }
    }

    /// Account the payout is funded from.
    #[must_use]
    pub const fn funding_account_code(self) -> &'static str {
        match self {
            Self::ServiceFee => codes::MOBILE_MONEY_ESCROW,
            Self::Commission => codes::OPERATING_BANK,
        }
    }
}

impl fmt::Display for SettlementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement lifecycle status.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Approved → Processing (process)
/// - Processing → Completed (complete)
/// - Processing → Failed (fail)
/// - Pending → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Generated, awaiting approval.
    Pending,
    /// Approved for payout.
    Approved,
    /// Payout initiated with the bank.
    Processing,
    /// Payout confirmed.
    Completed,
    /// Payout failed.
    Failed,
    /// Withdrawn before approval.
    Cancelled,
}

impl SettlementStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated state transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementAction {
    /// Pending → Approved.
    Approve {
        /// Approving operator.
        approved_by: ActorId,
        /// Approval time.
        approved_at: DateTime<Utc>,
    },
    /// Approved → Processing.
    Process {
        /// Bank payout reference.
        bank_reference: String,
        /// Payout initiation time.
        processed_at: DateTime<Utc>,
    },
    /// Processing → Completed.
    Complete {
        /// External confirmation id.
        confirmation_reference: String,
        /// Settlement time.
        settled_at: DateTime<Utc>,
    },
    /// Processing → Failed.
    Fail {
        /// Why the payout failed.
        failure_reason: String,
    },
    /// Pending → Cancelled.
    Cancel {
        /// Why the settlement was withdrawn.
        cancellation_reason: String,
    },
}

impl SettlementAction {
    /// Returns the status this action moves to.
    #[must_use]
    pub const fn new_status(&self) -> SettlementStatus {
        match self {
            Self::Approve { .. } => SettlementStatus::Approved,
            Self::Process { .. } => SettlementStatus::Processing,
            Self::Complete { .. } => SettlementStatus::Completed,
            Self::Fail { .. } => SettlementStatus::Failed,
            Self::Cancel { .. } => SettlementStatus::Cancelled,
        }
    }
}

/// Inclusive settlement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementPeriod {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl SettlementPeriod {
    /// Creates a period, rejecting `start > end`.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Returns true if the two periods share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Message sent to partners and operators on a settlement milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementNotice {
    /// Settlement number.
    pub settlement_number: String,
    /// Partner paid.
    pub partner: PartnerType,
    /// Settlement type.
    pub settlement_type: SettlementType,
    /// Status reached.
    pub status: SettlementStatus,
    /// Amount owed or paid.
    pub amount: Cents,
    /// Bank or confirmation reference, when known.
    pub reference: Option<String>,
}

impl SettlementNotice {
    /// Renders a short human readable message.
    #[must_use]
    pub fn message(&self) -> String {
        let base = format!(
            "Settlement {} ({} {}) is {}: {}",
            self.settlement_number,
            self.partner.as_str().to_uppercase(),
            self.settlement_type,
            self.status,
            self.amount
        );
        match &self.reference {
            Some(r) => format!("{base}, ref {r}"),
            None => base,
        }
    }
}

/// Stored settlement snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Settlement ID.
    pub id: SettlementId,
    /// Human readable number (`STL-YYYYMMDD-NNNN`).
    pub settlement_number: String,
    /// Partner owed.
    pub partner: PartnerType,
    /// Service fee or commission.
    pub settlement_type: SettlementType,
    /// Lifecycle status.
    pub status: SettlementStatus,
    /// Amount owed.
    pub amount: Cents,
    /// Period covered.
    pub period: SettlementPeriod,
    /// Approving operator.
    pub approved_by: Option<ActorId>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Bank payout reference.
    pub bank_reference: Option<String>,
    /// Payout initiation time.
    pub processed_at: Option<DateTime<Utc>>,
    /// External confirmation id.
    pub confirmation_reference: Option<String>,
    /// Settlement time.
    pub settled_at: Option<DateTime<Utc>>,
    /// Failure reason.
    pub failure_reason: Option<String>,
    /// Cancellation reason.
    pub cancellation_reason: Option<String>,
    /// Commission accrual entry, once posted.
    pub accrual_entry_id: Option<JournalEntryId>,
    /// Payout entry, once posted.
    pub payout_entry_id: Option<JournalEntryId>,
}

impl Settlement {
    /// Whether an approval-time commission accrual is owed.
    #[must_use]
    pub fn needs_accrual(&self) -> bool {
        self.settlement_type == SettlementType::Commission
            && matches!(
                self.status,
                SettlementStatus::Approved | SettlementStatus::Processing | SettlementStatus::Completed
            )
            && self.accrual_entry_id.is_none()
    }

    /// Whether a payout entry is owed.
    #[must_use]
    pub fn needs_payout(&self) -> bool {
        self.status == SettlementStatus::Completed && self.payout_entry_id.is_none()
    }

    /// Notice describing the current status.
    #[must_use]
    pub fn notice(&self) -> SettlementNotice {
        SettlementNotice {
            settlement_number: self.settlement_number.clone(),
            partner: self.partner,
            settlement_type: self.settlement_type,
            status: self.status,
            amount: self.amount,
            reference: self
                .confirmation_reference
                .clone()
                .or_else(|| self.bank_reference.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in [
            SettlementStatus::Pending,
            SettlementStatus::Approved,
            SettlementStatus::Processing,
            SettlementStatus::Completed,
            SettlementStatus::Failed,
            SettlementStatus::Cancelled,
        ] {
            assert_eq!(SettlementStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(SettlementStatus::parse("settled"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SettlementStatus::Pending.is_terminal());
        assert!(!SettlementStatus::Approved.is_terminal());
        assert!(!SettlementStatus::Processing.is_terminal());
        assert!(SettlementStatus::Completed.is_terminal());
        assert!(SettlementStatus::Failed.is_terminal());
        assert!(SettlementStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_partner_accounts() {
        assert_eq!(PartnerType::Kba.payable_code(SettlementType::ServiceFee), "2030");
        assert_eq!(PartnerType::Robs.payable_code(SettlementType::ServiceFee), "2040");
        assert_eq!(PartnerType::Kba.payable_code(SettlementType::Commission), "2050");
        assert_eq!(PartnerType::Robs.payable_code(SettlementType::Commission), "2060");
        assert_eq!(SettlementType::ServiceFee.funding_account_code(), "1010");
        assert_eq!(SettlementType::Commission.funding_account_code(), "1020");
    }

    #[test]
    fn test_period_overlap() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
        let jan_1_15 = SettlementPeriod::new(d(1), d(15)).unwrap();
        let jan_15_31 = SettlementPeriod::new(d(15), d(31)).unwrap();
        let jan_16_31 = SettlementPeriod::new(d(16), d(31)).unwrap();
        assert!(jan_1_15.overlaps(&jan_15_31));
        assert!(!jan_1_15.overlaps(&jan_16_31));
        assert!(SettlementPeriod::new(d(2), d(1)).is_none());
    }

    #[test]
    fn test_notice_message() {
        let notice = SettlementNotice {
            settlement_number: "STL-20260131-0001".into(),
            partner: PartnerType::Kba,
            settlement_type: SettlementType::ServiceFee,
            status: SettlementStatus::Completed,
            amount: Cents(120_000),
            reference: Some("CONF-9".into()),
        };
        assert_eq!(
            notice.message(),
            "Settlement STL-20260131-0001 (KBA service_fee) is completed: 1200.00, ref CONF-9"
        );
    }
}
