//! `SeaORM` Entity for reconciliations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ReconciliationStatus, ReconciliationType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reconciliation_type: ReconciliationType,
    pub reconciliation_date: Date,
    pub source_name: String,
    pub source_balance: i64,
    pub ledger_balance: i64,
    pub variance: i64,
    pub total_items: i32,
    pub matched_count: i32,
    pub unmatched_count: i32,
    pub manual_matched_count: i32,
    pub status: ReconciliationStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reconciliation_items::Entity")]
    ReconciliationItems,
}

impl Related<super::reconciliation_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
