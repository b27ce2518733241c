//! `SeaORM` Entity for partner_settlements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PartnerType, SettlementStatus, SettlementType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "partner_settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub settlement_number: String,
    pub partner_type: PartnerType,
    pub settlement_type: SettlementType,
    pub status: SettlementStatus,
    pub total_amount: i64,
    pub period_start: Date,
    pub period_end: Date,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub bank_reference: Option<String>,
    pub processed_at: Option<DateTimeWithTimeZone>,
    pub confirmation_reference: Option<String>,
    pub settled_at: Option<DateTimeWithTimeZone>,
    pub failure_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub accrual_entry_id: Option<Uuid>,
    pub payout_entry_id: Option<Uuid>,
    /// Set while the settlement holds its partner, type and period.
    #[sea_orm(unique)]
    pub active_key: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
