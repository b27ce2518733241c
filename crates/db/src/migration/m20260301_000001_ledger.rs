//! Ledger schema: chart of accounts, journal entries and their lines.
//!
//! Money columns are BIGINT cents. The unique indexes on
//! `source_transaction_id` and `entry_number` back posting idempotency and
//! entry numbering.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum GlAccounts {
    Table,
    Id,
    Code,
    Name,
    AccountType,
    NormalBalance,
    Balance,
    Status,
    ParentId,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(super) enum JournalEntries {
    Table,
    Id,
    EntryNumber,
    EntryType,
    EntryDate,
    Status,
    SourceTransactionId,
    RiderId,
    Description,
    ReversedBy,
    ReversalReason,
    PostedAt,
    CreatedAt,
}

#[derive(Iden)]
enum JournalEntryLines {
    Table,
    Id,
    JournalEntryId,
    LineNumber,
    AccountId,
    AccountCode,
    Debit,
    Credit,
    Description,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GlAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GlAccounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GlAccounts::Code).string_len(16).not_null())
                    .col(ColumnDef::new(GlAccounts::Name).string().not_null())
                    .col(ColumnDef::new(GlAccounts::AccountType).string_len(32).not_null())
                    .col(ColumnDef::new(GlAccounts::NormalBalance).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GlAccounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(GlAccounts::Status).string_len(32).not_null())
                    .col(ColumnDef::new(GlAccounts::ParentId).uuid())
                    .col(
                        ColumnDef::new(GlAccounts::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GlAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GlAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-gl_accounts-parent_id")
                            .from(GlAccounts::Table, GlAccounts::ParentId)
                            .to(GlAccounts::Table, GlAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-gl_accounts-code")
                    .table(GlAccounts::Table)
                    .col(GlAccounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::EntryNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::EntryType).string_len(32).not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Status).string_len(32).not_null())
                    .col(
                        ColumnDef::new(JournalEntries::SourceTransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::RiderId).uuid())
                    .col(ColumnDef::new(JournalEntries::Description).text().not_null())
                    .col(ColumnDef::new(JournalEntries::ReversedBy).uuid())
                    .col(ColumnDef::new(JournalEntries::ReversalReason).text())
                    .col(ColumnDef::new(JournalEntries::PostedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-journal_entries-source_transaction_id")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::SourceTransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-journal_entries-entry_number")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::EntryNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-entry_date-entry_type")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::EntryDate)
                    .col(JournalEntries::EntryType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntryLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntryLines::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::JournalEntryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::LineNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntryLines::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(JournalEntryLines::AccountCode)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Debit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Credit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JournalEntryLines::Description).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entry_lines-journal_entry_id")
                            .from(JournalEntryLines::Table, JournalEntryLines::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entry_lines-account_id")
                            .from(JournalEntryLines::Table, JournalEntryLines::AccountId)
                            .to(GlAccounts::Table, GlAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entry_lines-journal_entry_id")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::JournalEntryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entry_lines-account_code")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::AccountCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalEntryLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GlAccounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
