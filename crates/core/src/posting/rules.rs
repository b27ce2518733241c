//! Allocation table: business event → balanced journal lines.
//!
//! All arithmetic is integer cents. Fixed fee lines are computed first and
//! premium payable (2010) absorbs the remainder of every receipt, so each
//! split balances exactly by construction. Every draft is still run through
//! `validate_lines` before it leaves this module.

use premia_shared::config::PostingConfig;
use premia_shared::types::Cents;

use super::error::PostingError;
use super::types::{
    CommissionReceipt, PaymentReceipt, PremiumRemittance, ReceiptKind, RefundInitiation,
    RefundPayout, ServiceFeeDistribution, SettlementPosting, accrual_source_id, payout_source_id,
    reversal_source_id,
};
use crate::ledger::{
    EntryDraft, EntryStatus, EntryType, JournalEntry, JournalLineInput, LedgerError, codes,
    drop_zero_lines, validate_lines,
};
use crate::settlement::SettlementType;

/// Per-rider fixed fees, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingPolicy {
    /// Platform fee on the day-1 deposit.
    pub day_one_platform_fee: Cents,
    /// KBA fee on the day-1 deposit.
    pub day_one_kba_fee: Cents,
    /// ROBS fee on the day-1 deposit.
    pub day_one_robs_fee: Cents,
    /// Platform fee per covered day.
    pub daily_platform_fee: Cents,
    /// KBA fee per covered day.
    pub daily_kba_fee: Cents,
    /// ROBS fee per covered day.
    pub daily_robs_fee: Cents,
}

impl Default for PostingPolicy {
    fn default() -> Self {
        Self::from(&PostingConfig::default())
    }
}

impl From<&PostingConfig> for PostingPolicy {
    fn from(config: &PostingConfig) -> Self {
        Self {
            day_one_platform_fee: Cents(config.day_one_platform_fee_cents),
            day_one_kba_fee: Cents(config.day_one_kba_fee_cents),
            day_one_robs_fee: Cents(config.day_one_robs_fee_cents),
            daily_platform_fee: Cents(config.daily_platform_fee_cents),
            daily_kba_fee: Cents(config.daily_kba_fee_cents),
            daily_robs_fee: Cents(config.daily_robs_fee_cents),
        }
    }
}

/// Fee lines of one receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptFees {
    /// Platform service fee.
    pub platform: Cents,
    /// KBA service fee.
    pub kba: Cents,
    /// ROBS service fee.
    pub robs: Cents,
}

impl ReceiptFees {
    /// Sum of the three fees.
    #[must_use]
    pub fn total(&self) -> Cents {
        self.platform + self.kba + self.robs
    }
}

/// Translates business events into entry drafts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostingRules {
    policy: PostingPolicy,
}

impl PostingRules {
    /// Creates rules over the given fee policy.
    #[must_use]
    pub const fn new(policy: PostingPolicy) -> Self {
        Self { policy }
    }

    /// Returns the fee policy.
    #[must_use]
    pub const fn policy(&self) -> &PostingPolicy {
        &self.policy
    }

    /// Fixed fees for a receipt kind, scaled by covered days for daily payments.
    ///
    /// # Errors
    ///
    /// `InvalidDays` for a zero-day daily payment, `Overflow` if scaling overflows.
    pub fn receipt_fees(&self, kind: ReceiptKind) -> Result<ReceiptFees, PostingError> {
        match kind {
            ReceiptKind::DayOne => Ok(ReceiptFees {
                platform: self.policy.day_one_platform_fee,
                kba: self.policy.day_one_kba_fee,
                robs: self.policy.day_one_robs_fee,
            }),
            ReceiptKind::Daily { days } => {
                if days == 0 {
                    return Err(PostingError::InvalidDays);
                }
                let n = i64::from(days);
                let scale = |fee: Cents| fee.checked_mul(n).ok_or(PostingError::Overflow);
                Ok(ReceiptFees {
                    platform: scale(self.policy.daily_platform_fee)?,
                    kba: scale(self.policy.daily_kba_fee)?,
                    robs: scale(self.policy.daily_robs_fee)?,
                })
            }
        }
    }

    /// Premium receipt: escrow in, fees and premium payable out.
    ///
    /// # Errors
    ///
    /// Fails when the amount is not positive or does not cover the fixed fees.
    pub fn payment_receipt(&self, event: &PaymentReceipt) -> Result<EntryDraft, PostingError> {
        require_positive(event.amount, "amount")?;
        let fees = self.receipt_fees(event.kind)?;
        let premium = event.amount - fees.total();
        if premium.is_negative() {
            return Err(PostingError::ReceiptBelowFees {
                amount: event.amount,
                fees: fees.total(),
            });
        }

        let (entry_type, description) = match event.kind {
            ReceiptKind::DayOne => (
                EntryType::PaymentReceiptDay1,
                "Day-1 premium deposit".to_string(),
            ),
            ReceiptKind::Daily { days } => (
                EntryType::PaymentReceiptDaily,
                format!("Daily premium payment ({days} day(s))"),
            ),
        };

        let lines = vec![
            JournalLineInput::debit(codes::MOBILE_MONEY_ESCROW, event.amount),
            JournalLineInput::credit(codes::PLATFORM_SERVICE_FEE_INCOME, fees.platform),
            JournalLineInput::credit(codes::KBA_SERVICE_FEE_PAYABLE, fees.kba),
            JournalLineInput::credit(codes::ROBS_SERVICE_FEE_PAYABLE, fees.robs),
            JournalLineInput::credit(codes::PREMIUM_PAYABLE, premium),
        ];

        finish(EntryDraft {
            entry_type,
            entry_date: event.date,
            source_transaction_id: event.source_transaction_id.clone(),
            rider_id: event.rider_id,
            description,
            lines,
        })
    }

    /// Refund initiation: premium payable released to refunds payable and fee income.
    ///
    /// # Errors
    ///
    /// Fails when the refund is not positive or the fee is negative.
    pub fn refund_initiation(&self, event: &RefundInitiation) -> Result<EntryDraft, PostingError> {
        require_positive(event.amount, "amount")?;
        if event.fee.is_negative() {
            return Err(PostingError::NonPositiveAmount("fee"));
        }
        let gross = event
            .amount
            .checked_add(event.fee)
            .ok_or(PostingError::Overflow)?;

        finish(EntryDraft {
            entry_type: EntryType::RefundInitiation,
            entry_date: event.date,
            source_transaction_id: event.source_transaction_id.clone(),
            rider_id: event.rider_id,
            description: "Refund initiated".to_string(),
            lines: vec![
                JournalLineInput::debit(codes::PREMIUM_PAYABLE, gross),
                JournalLineInput::credit(codes::REFUNDS_PAYABLE, event.amount),
                JournalLineInput::credit(codes::REFUND_PROCESSING_FEE_INCOME, event.fee),
            ],
        })
    }

    /// Refund payout: refunds payable cleared from escrow.
    ///
    /// # Errors
    ///
    /// Fails when the amount is not positive.
    pub fn refund_payout(&self, event: &RefundPayout) -> Result<EntryDraft, PostingError> {
        require_positive(event.amount, "amount")?;
        finish(EntryDraft {
            entry_type: EntryType::RefundPayout,
            entry_date: event.date,
            source_transaction_id: event.source_transaction_id.clone(),
            rider_id: event.rider_id,
            description: "Refund paid out".to_string(),
            lines: vec![
                JournalLineInput::debit(codes::REFUNDS_PAYABLE, event.amount),
                JournalLineInput::credit(codes::MOBILE_MONEY_ESCROW, event.amount),
            ],
        })
    }

    /// Premium remittance: premium payable cleared from escrow.
    ///
    /// # Errors
    ///
    /// Fails when the amount is not positive.
    pub fn premium_remittance(&self, event: &PremiumRemittance) -> Result<EntryDraft, PostingError> {
        require_positive(event.amount, "amount")?;
        finish(EntryDraft {
            entry_type: EntryType::PremiumRemittance,
            entry_date: event.date,
            source_transaction_id: event.source_transaction_id.clone(),
            rider_id: None,
            description: "Premium remitted to underwriter".to_string(),
            lines: vec![
                JournalLineInput::debit(codes::PREMIUM_PAYABLE, event.amount),
                JournalLineInput::credit(codes::MOBILE_MONEY_ESCROW, event.amount),
            ],
        })
    }

    /// Service fee distribution: escrow paid out to the platform bank and partner payables.
    ///
    /// # Errors
    ///
    /// Fails when any share is negative or all are zero.
    pub fn service_fee_distribution(
        &self,
        event: &ServiceFeeDistribution,
    ) -> Result<EntryDraft, PostingError> {
        for (share, name) in [
            (event.platform, "platform"),
            (event.kba, "kba"),
            (event.robs, "robs"),
        ] {
            if share.is_negative() {
                return Err(PostingError::NonPositiveAmount(name));
            }
        }
        let total = event
            .platform
            .checked_add(event.kba)
            .and_then(|t| t.checked_add(event.robs))
            .ok_or(PostingError::Overflow)?;
        require_positive(total, "total")?;

        finish(EntryDraft {
            entry_type: EntryType::ServiceFeeDistribution,
            entry_date: event.date,
            source_transaction_id: event.source_transaction_id.clone(),
            rider_id: None,
            description: "Service fee distribution".to_string(),
            lines: vec![
                JournalLineInput::debit(codes::OPERATING_BANK, event.platform),
                JournalLineInput::debit(codes::KBA_SERVICE_FEE_PAYABLE, event.kba),
                JournalLineInput::debit(codes::ROBS_SERVICE_FEE_PAYABLE, event.robs),
                JournalLineInput::credit(codes::MOBILE_MONEY_ESCROW, total),
            ],
        })
    }

    /// Commission receipt: operating bank in, commission income out.
    ///
    /// # Errors
    ///
    /// Fails when the amount is not positive.
    pub fn commission_receipt(&self, event: &CommissionReceipt) -> Result<EntryDraft, PostingError> {
        require_positive(event.amount, "amount")?;
        finish(EntryDraft {
            entry_type: EntryType::CommissionReceipt,
            entry_date: event.date,
            source_transaction_id: event.source_transaction_id.clone(),
            rider_id: None,
            description: "Commission received from underwriter".to_string(),
            lines: vec![
                JournalLineInput::debit(codes::OPERATING_BANK, event.amount),
                JournalLineInput::credit(codes::COMMISSION_INCOME, event.amount),
            ],
        })
    }

    /// Commission accrual for an approved commission settlement.
    ///
    /// # Errors
    ///
    /// `NotApplicable` for service fee settlements, or a non-positive amount.
    pub fn commission_accrual(&self, s: &SettlementPosting) -> Result<EntryDraft, PostingError> {
        if s.settlement_type != SettlementType::Commission {
            return Err(PostingError::NotApplicable(
                "commission accrual on a service fee settlement",
            ));
        }
        require_positive(s.amount, "amount")?;
        finish(EntryDraft {
            entry_type: EntryType::CommissionAccrual,
            entry_date: s.date,
            source_transaction_id: accrual_source_id(s.settlement_id),
            rider_id: None,
            description: format!("Commission accrual for {}", s.settlement_number),
            lines: vec![
                JournalLineInput::debit(codes::PARTNER_COMMISSION_EXPENSE, s.amount),
                JournalLineInput::credit(s.partner.commission_payable_code(), s.amount),
            ],
        })
    }

    /// Payout of a completed settlement: partner payable cleared from its funding account.
    ///
    /// # Errors
    ///
    /// Fails on a non-positive amount.
    pub fn settlement_payout(&self, s: &SettlementPosting) -> Result<EntryDraft, PostingError> {
        require_positive(s.amount, "amount")?;
        finish(EntryDraft {
            entry_type: EntryType::SettlementPayout,
            entry_date: s.date,
            source_transaction_id: payout_source_id(s.settlement_id),
            rider_id: None,
            description: format!("Settlement payout {}", s.settlement_number),
            lines: vec![
                JournalLineInput::debit(s.partner.payable_code(s.settlement_type), s.amount),
                JournalLineInput::credit(s.settlement_type.funding_account_code(), s.amount),
            ],
        })
    }

    /// Reversal of a posted entry: same lines, sides swapped.
    ///
    /// # Errors
    ///
    /// `CannotReverse` unless the original is Posted.
    pub fn reversal(
        &self,
        original: &JournalEntry,
        reason: &str,
        date: chrono::NaiveDate,
    ) -> Result<EntryDraft, PostingError> {
        if original.status != EntryStatus::Posted {
            return Err(LedgerError::CannotReverse(original.status).into());
        }
        let lines = original
            .lines
            .iter()
            .map(|l| JournalLineInput {
                account_code: l.account_code.clone(),
                debit: l.credit,
                credit: l.debit,
                description: l.description.clone(),
            })
            .collect();

        finish(EntryDraft {
            entry_type: EntryType::Reversal,
            entry_date: date,
            source_transaction_id: reversal_source_id(original.id),
            rider_id: original.rider_id,
            description: format!("Reversal of {}: {reason}", original.entry_number),
            lines,
        })
    }
}

fn require_positive(amount: Cents, field: &'static str) -> Result<(), PostingError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(PostingError::NonPositiveAmount(field))
    }
}

fn finish(mut draft: EntryDraft) -> Result<EntryDraft, PostingError> {
    draft.lines = drop_zero_lines(draft.lines);
    validate_lines(&draft.lines)?;
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use premia_shared::types::{GlAccountId, JournalEntryId, SettlementId};

    use crate::ledger::JournalLine;
    use crate::settlement::PartnerType;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn line_amount(draft: &EntryDraft, code: &str) -> (Cents, Cents) {
        draft
            .lines
            .iter()
            .filter(|l| l.account_code == code)
            .fold((Cents::ZERO, Cents::ZERO), |(d, c), l| (d + l.debit, c + l.credit))
    }

    fn receipt(amount: i64, kind: ReceiptKind) -> PaymentReceipt {
        PaymentReceipt {
            source_transaction_id: "MM-1".into(),
            rider_id: None,
            amount: Cents(amount),
            date: day(),
            kind,
        }
    }

    #[test]
    fn test_day_one_deposit_split() {
        let draft = PostingRules::default()
            .payment_receipt(&receipt(104_800, ReceiptKind::DayOne))
            .unwrap();
        assert_eq!(draft.entry_type, EntryType::PaymentReceiptDay1);
        assert_eq!(line_amount(&draft, "1010"), (Cents(104_800), Cents::ZERO));
        assert_eq!(line_amount(&draft, "4010").1, Cents(2_400));
        assert_eq!(line_amount(&draft, "2030").1, Cents(1_200));
        assert_eq!(line_amount(&draft, "2040").1, Cents(1_200));
        assert_eq!(line_amount(&draft, "2010").1, Cents(100_000));
        let debits: Cents = draft.lines.iter().map(|l| l.debit).sum();
        assert_eq!(debits, Cents(104_800));
        assert_eq!(draft.lines.iter().filter(|l| l.debit.is_positive()).count(), 1);
    }

    #[test]
    fn test_daily_payment_scales_by_days() {
        let draft = PostingRules::default()
            .payment_receipt(&receipt(26_100, ReceiptKind::Daily { days: 3 }))
            .unwrap();
        assert_eq!(draft.entry_type, EntryType::PaymentReceiptDaily);
        assert_eq!(line_amount(&draft, "4010").1, Cents(600));
        assert_eq!(line_amount(&draft, "2030").1, Cents(300));
        assert_eq!(line_amount(&draft, "2040").1, Cents(300));
        assert_eq!(line_amount(&draft, "2010").1, Cents(24_900));
    }

    #[test]
    fn test_receipt_below_fees_rejected() {
        let result = PostingRules::default().payment_receipt(&receipt(399, ReceiptKind::Daily { days: 1 }));
        assert!(matches!(result, Err(PostingError::ReceiptBelowFees { .. })));
    }

    #[test]
    fn test_receipt_exactly_fees_drops_premium_line() {
        let draft = PostingRules::default()
            .payment_receipt(&receipt(400, ReceiptKind::Daily { days: 1 }))
            .unwrap();
        assert_eq!(draft.lines.len(), 4);
        assert_eq!(line_amount(&draft, "2010"), (Cents::ZERO, Cents::ZERO));
    }

    #[test]
    fn test_zero_days_rejected() {
        let result = PostingRules::default().payment_receipt(&receipt(8_700, ReceiptKind::Daily { days: 0 }));
        assert!(matches!(result, Err(PostingError::InvalidDays)));
    }

    #[test]
    fn test_refund_with_and_without_fee() {
        let rules = PostingRules::default();
        let mut refund = RefundInitiation {
            source_transaction_id: "RF-1".into(),
            rider_id: None,
            amount: Cents(50_000),
            fee: Cents(1_000),
            date: day(),
        };
        let draft = rules.refund_initiation(&refund).unwrap();
        assert_eq!(line_amount(&draft, "2010").0, Cents(51_000));
        assert_eq!(line_amount(&draft, "2020").1, Cents(50_000));
        assert_eq!(line_amount(&draft, "4030").1, Cents(1_000));

        refund.fee = Cents::ZERO;
        let draft = rules.refund_initiation(&refund).unwrap();
        assert_eq!(draft.lines.len(), 2);
    }

    #[test]
    fn test_service_fee_distribution() {
        let draft = PostingRules::default()
            .service_fee_distribution(&ServiceFeeDistribution {
                source_transaction_id: "SFD-1".into(),
                platform: Cents(2_400),
                kba: Cents(1_200),
                robs: Cents::ZERO,
                date: day(),
            })
            .unwrap();
        assert_eq!(draft.lines.len(), 3);
        assert_eq!(line_amount(&draft, "1010").1, Cents(3_600));
    }

    #[test]
    fn test_settlement_postings() {
        let rules = PostingRules::default();
        let s = SettlementPosting {
            settlement_id: SettlementId::new(),
            settlement_number: "STL-20260131-0001".into(),
            partner: PartnerType::Robs,
            settlement_type: SettlementType::Commission,
            amount: Cents(23_505),
            date: day(),
        };
        let accrual = rules.commission_accrual(&s).unwrap();
        assert_eq!(line_amount(&accrual, "5010").0, Cents(23_505));
        assert_eq!(line_amount(&accrual, "2060").1, Cents(23_505));
        assert!(accrual.source_transaction_id.ends_with(":accrual"));

        let payout = rules.settlement_payout(&s).unwrap();
        assert_eq!(line_amount(&payout, "2060").0, Cents(23_505));
        assert_eq!(line_amount(&payout, "1020").1, Cents(23_505));

        let fee = SettlementPosting {
            settlement_type: SettlementType::ServiceFee,
            ..s
        };
        assert!(matches!(
            rules.commission_accrual(&fee),
            Err(PostingError::NotApplicable(_))
        ));
        let payout = rules.settlement_payout(&fee).unwrap();
        assert_eq!(line_amount(&payout, "2040").0, Cents(23_505));
        assert_eq!(line_amount(&payout, "1010").1, Cents(23_505));
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let account_id = GlAccountId::new();
        let original = JournalEntry {
            id: JournalEntryId::new(),
            entry_number: "JE-20260115-0001".into(),
            entry_type: EntryType::PremiumRemittance,
            entry_date: day(),
            status: EntryStatus::Posted,
            source_transaction_id: "REM-1".into(),
            rider_id: None,
            description: "Premium remitted".into(),
            lines: vec![
                JournalLine {
                    account_id,
                    account_code: "2010".into(),
                    debit: Cents(500),
                    credit: Cents::ZERO,
                    description: None,
                },
                JournalLine {
                    account_id,
                    account_code: "1010".into(),
                    debit: Cents::ZERO,
                    credit: Cents(500),
                    description: None,
                },
            ],
        };
        let rules = PostingRules::default();
        let draft = rules.reversal(&original, "wrong amount", day()).unwrap();
        assert_eq!(line_amount(&draft, "2010"), (Cents::ZERO, Cents(500)));
        assert_eq!(line_amount(&draft, "1010"), (Cents(500), Cents::ZERO));
        assert_eq!(draft.source_transaction_id, format!("reversal:{}", original.id));

        let reversed = JournalEntry {
            status: EntryStatus::Reversed,
            ..original
        };
        assert!(matches!(
            rules.reversal(&reversed, "again", day()),
            Err(PostingError::Ledger(LedgerError::CannotReverse(EntryStatus::Reversed)))
        ));
    }
}
