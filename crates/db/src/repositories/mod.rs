//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod gl_account;
pub mod journal;
pub mod report;

pub use gl_account::{CreateAccountInput, GlAccountError, GlAccountRepository};
pub use journal::{JournalError, JournalRepository};
pub use report::{ReportQueryError, ReportRepository};
