//! `SeaORM` entity definitions.
//!
//! Enum-valued columns are stored as lowercase tags and converted to the
//! domain enums in [`crate::convert`].

pub mod prelude;

pub mod accounting_periods;
pub mod accounts;
pub mod companies;
pub mod journal_entries;
pub mod journal_lines;
pub mod journal_sequences;
pub mod ledger_rows;
pub mod party_balances;
