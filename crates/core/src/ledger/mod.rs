//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Chart of accounts and the normal-balance sign rule
//! - Journal entries, lines and ledger rows
//! - Posting requests, line validation and entry numbering
//! - Error types for ledger operations
//! - Ledger service for entry validation and row planning

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod numbering;
pub mod policy;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountSubtype, AccountType, CashFlowCategory, NewAccount};
pub use balance::{NormalBalance, RunningBalance};
pub use entry::{EntryStatus, JournalEntry, JournalLine, LedgerRow, SourceDocument, SourceDocumentType};
pub use error::LedgerError;
pub use numbering::EntryNumber;
pub use policy::PostingPolicy;
pub use service::{LedgerService, PlannedRow, RowPlan, ValidatedEntry};
pub use types::{
    EntryDisposition, EntryTotals, PostingLine, PostingReceipt, PostingRequest, PostingWarning,
    VoidReceipt, VoidRequest,
};
