//! Financial report generation.
//!
//! This module provides pure business logic for deriving reports from
//! per-account ledger activity:
//! - Trial Balance
//! - Balance Sheet
//! - Income Statement
//! - Cash Flow Statement
//! - Account Ledger

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
