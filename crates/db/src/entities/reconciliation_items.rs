//! `SeaORM` Entity for reconciliation_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ItemStatus, MatchType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reconciliation_id: Uuid,
    /// Statement order, starting at 1.
    pub line_number: i32,
    pub source_reference: String,
    pub source_amount: i64,
    pub source_date: Date,
    pub matched_transaction_id: Option<String>,
    pub matched_journal_entry_id: Option<Uuid>,
    pub ledger_amount: Option<i64>,
    pub match_type: MatchType,
    pub match_confidence: i32,
    pub status: ItemStatus,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reconciliations::Entity",
        from = "Column::ReconciliationId",
        to = "super::reconciliations::Column::Id"
    )]
    Reconciliations,
}

impl Related<super::reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
