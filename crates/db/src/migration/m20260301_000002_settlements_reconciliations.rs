//! Partner settlements and statement reconciliation records.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_ledger::JournalEntries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum PartnerSettlements {
    Table,
    Id,
    SettlementNumber,
    PartnerType,
    SettlementType,
    Status,
    TotalAmount,
    PeriodStart,
    PeriodEnd,
    ApprovedBy,
    ApprovedAt,
    BankReference,
    ProcessedAt,
    ConfirmationReference,
    SettledAt,
    FailureReason,
    CancellationReason,
    AccrualEntryId,
    PayoutEntryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Reconciliations {
    Table,
    Id,
    ReconciliationType,
    ReconciliationDate,
    SourceName,
    SourceBalance,
    LedgerBalance,
    Variance,
    TotalItems,
    MatchedCount,
    UnmatchedCount,
    ManualMatchedCount,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ReconciliationItems {
    Table,
    Id,
    ReconciliationId,
    LineNumber,
    SourceReference,
    SourceAmount,
    SourceDate,
    MatchedTransactionId,
    MatchedJournalEntryId,
    LedgerAmount,
    MatchType,
    MatchConfidence,
    Status,
    ResolvedBy,
    ResolutionNotes,
    ResolvedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PartnerSettlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartnerSettlements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PartnerSettlements::SettlementNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerSettlements::PartnerType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerSettlements::SettlementType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartnerSettlements::Status).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PartnerSettlements::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartnerSettlements::PeriodStart).date().not_null())
                    .col(ColumnDef::new(PartnerSettlements::PeriodEnd).date().not_null())
                    .col(ColumnDef::new(PartnerSettlements::ApprovedBy).uuid())
                    .col(ColumnDef::new(PartnerSettlements::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PartnerSettlements::BankReference).string())
                    .col(ColumnDef::new(PartnerSettlements::ProcessedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PartnerSettlements::ConfirmationReference).string())
                    .col(ColumnDef::new(PartnerSettlements::SettledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PartnerSettlements::FailureReason).text())
                    .col(ColumnDef::new(PartnerSettlements::CancellationReason).text())
                    .col(ColumnDef::new(PartnerSettlements::AccrualEntryId).uuid())
                    .col(ColumnDef::new(PartnerSettlements::PayoutEntryId).uuid())
                    .col(
                        ColumnDef::new(PartnerSettlements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerSettlements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-partner_settlements-settlement_number")
                    .table(PartnerSettlements::Table)
                    .col(PartnerSettlements::SettlementNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-partner_settlements-partner-period")
                    .table(PartnerSettlements::Table)
                    .col(PartnerSettlements::PartnerType)
                    .col(PartnerSettlements::SettlementType)
                    .col(PartnerSettlements::PeriodStart)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reconciliations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reconciliations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::ReconciliationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::ReconciliationDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reconciliations::SourceName).string().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::SourceBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::LedgerBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reconciliations::Variance).big_integer().not_null())
                    .col(ColumnDef::new(Reconciliations::TotalItems).integer().not_null())
                    .col(ColumnDef::new(Reconciliations::MatchedCount).integer().not_null())
                    .col(ColumnDef::new(Reconciliations::UnmatchedCount).integer().not_null())
                    .col(
                        ColumnDef::new(Reconciliations::ManualMatchedCount)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reconciliations::Status).string_len(32).not_null())
                    .col(ColumnDef::new(Reconciliations::CreatedBy).uuid())
                    .col(
                        ColumnDef::new(Reconciliations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reconciliations-date-source")
                    .table(Reconciliations::Table)
                    .col(Reconciliations::ReconciliationDate)
                    .col(Reconciliations::SourceName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReconciliationItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReconciliationItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationItems::ReconciliationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationItems::LineNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationItems::SourceReference)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationItems::SourceAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReconciliationItems::SourceDate).date().not_null())
                    .col(ColumnDef::new(ReconciliationItems::MatchedTransactionId).string())
                    .col(ColumnDef::new(ReconciliationItems::MatchedJournalEntryId).uuid())
                    .col(ColumnDef::new(ReconciliationItems::LedgerAmount).big_integer())
                    .col(
                        ColumnDef::new(ReconciliationItems::MatchType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationItems::MatchConfidence)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReconciliationItems::Status).string_len(32).not_null())
                    .col(ColumnDef::new(ReconciliationItems::ResolvedBy).uuid())
                    .col(ColumnDef::new(ReconciliationItems::ResolutionNotes).text())
                    .col(ColumnDef::new(ReconciliationItems::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reconciliation_items-reconciliation_id")
                            .from(ReconciliationItems::Table, ReconciliationItems::ReconciliationId)
                            .to(Reconciliations::Table, Reconciliations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reconciliation_items-matched_journal_entry_id")
                            .from(
                                ReconciliationItems::Table,
                                ReconciliationItems::MatchedJournalEntryId,
                            )
                            .to(JournalEntries::Table, JournalEntries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reconciliation_items-reconciliation_id")
                    .table(ReconciliationItems::Table)
                    .col(ReconciliationItems::ReconciliationId)
                    .col(ReconciliationItems::LineNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReconciliationItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reconciliations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartnerSettlements::Table).to_owned())
            .await?;
        Ok(())
    }
}
