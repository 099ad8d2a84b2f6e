//! Core ledger logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Accounts, journal entries, posting validation and the sign rule
//! - `fiscal` - Accounting periods, the period guard and closing entries
//! - `workflow` - Draft promotion and void/reversal rules
//! - `reconciliation` - Stored balance versus ledger comparison
//! - `reports` - Trial balance, balance sheet, income statement, cash flow
//! - `events` - Post-commit event fan-out

pub mod macros;

pub mod events;
pub mod fiscal;
pub mod ledger;
pub mod reconciliation;
pub mod reports;
pub mod workflow;
