//! String-backed enums stored in the database.
//!
//! Each enum mirrors a domain enum in `premia_core` and converts both ways.

use premia_core::{ledger, reconciliation, settlement};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Declares a `DeriveActiveEnum` and its conversions to and from the
/// matching core enum.
macro_rules! stored_enum {
    ($name:ident => $core:path { $($variant:ident = $value:literal),+ $(,)? }) => {
        #[doc = concat!("Stored form of `", stringify!($core), "`.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                #[sea_orm(string_value = $value)]
                $variant,
            )+
        }

        impl From<$core> for $name {
            fn from(value: $core) -> Self {
                type Core = $core;
                match value {
                    $(Core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$name> for $core {
            fn from(value: $name) -> Self {
                type Core = $core;
                match value {
                    $($name::$variant => Core::$variant,)+
                }
            }
        }
    };
}

stored_enum!(AccountType => ledger::AccountType {
    Asset = "asset",
    Liability = "liability",
    Equity = "equity",
    Income = "income",
    Expense = "expense",
});

stored_enum!(NormalBalance => ledger::NormalBalance {
    Debit = "debit",
    Credit = "credit",
});

stored_enum!(AccountStatus => ledger::AccountStatus {
    Active = "active",
    Inactive = "inactive",
});

stored_enum!(EntryStatus => ledger::EntryStatus {
    Draft = "draft",
    Posted = "posted",
    Reversed = "reversed",
});

stored_enum!(EntryType => ledger::EntryType {
    PaymentReceiptDay1 = "payment-receipt-day1",
    PaymentReceiptDaily = "payment-receipt-daily",
    RefundInitiation = "refund-initiation",
    RefundPayout = "refund-payout",
    PremiumRemittance = "premium-remittance",
    ServiceFeeDistribution = "service-fee-distribution",
    CommissionReceipt = "commission-receipt",
    CommissionAccrual = "commission-accrual",
    SettlementPayout = "settlement-payout",
    Reversal = "reversal",
});

stored_enum!(MatchType => reconciliation::MatchType {
    Exact = "exact",
    AmountOnly = "amount_only",
    ReferenceOnly = "reference_only",
    Fuzzy = "fuzzy",
    Manual = "manual",
    None = "none",
});

stored_enum!(ItemStatus => reconciliation::ItemStatus {
    Matched = "matched",
    Unmatched = "unmatched",
    Resolved = "resolved",
});

stored_enum!(ReconciliationStatus => reconciliation::ReconciliationStatus {
    Matched = "matched",
    PartiallyMatched = "partially_matched",
    Unmatched = "unmatched",
});

stored_enum!(ReconciliationType => reconciliation::ReconciliationType {
    DailyMobileMoney = "daily_mobile_money",
});

stored_enum!(PartnerType => settlement::PartnerType {
    Kba = "kba",
    Robs = "robs",
});

stored_enum!(SettlementType => settlement::SettlementType {
    ServiceFee = "service_fee",
    Commission = "commission",
});

stored_enum!(SettlementStatus => settlement::SettlementStatus {
    Pending = "pending",
    Approved = "approved",
    Processing = "processing",
    Completed = "completed",
    Failed = "failed",
    Cancelled = "cancelled",
});
