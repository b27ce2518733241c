//! `SeaORM` entity definitions.

pub mod gl_accounts;
pub mod journal_entries;
pub mod journal_entry_lines;
pub mod partner_settlements;
pub mod reconciliation_items;
pub mod reconciliations;
pub mod sea_orm_active_enums;
