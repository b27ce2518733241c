//! One live settlement per partner, type and period.
//!
//! `active_key` is set while a settlement holds its period and cleared on
//! cancellation. NULLs never collide, so cancelled rows stay out of the
//! unique index on both PostgreSQL and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum PartnerSettlements {
    Table,
    ActiveKey,
}

const INDEX: &str = "idx_partner_settlements_active_key";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PartnerSettlements::Table)
                    .add_column(ColumnDef::new(PartnerSettlements::ActiveKey).string_len(96))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(INDEX)
                    .table(PartnerSettlements::Table)
                    .col(PartnerSettlements::ActiveKey)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(INDEX)
                    .table(PartnerSettlements::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(PartnerSettlements::Table)
                    .drop_column(PartnerSettlements::ActiveKey)
                    .to_owned(),
            )
            .await
    }
}
