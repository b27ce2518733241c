//! Core business logic for Premia.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping logic and the chart of accounts
//! - `posting` - Business events and the rules that turn them into journal lines
//! - `commission` - Commission split between platform and partners
//! - `settlement` - Partner settlement lifecycle
//! - `reconciliation` - Statement matching
//! - `reports` - Financial statements and export rows
//! - `jobs` - Scheduled job outcomes

pub mod commission;
pub mod jobs;
pub mod ledger;
pub mod posting;
pub mod reconciliation;
pub mod reports;
pub mod settlement;
