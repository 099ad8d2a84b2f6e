//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Each public method runs in its own transaction; the `*_in` variants join a
//! caller-owned one.

pub mod account;
pub mod company;
pub mod journal;
pub mod ledger;
pub mod period;
pub mod reconciliation;
pub mod report;
pub mod subsidiary;

pub use account::AccountRepository;
pub use company::CompanyRepository;
pub use journal::JournalRepository;
pub use ledger::LedgerRepository;
pub use period::PeriodRepository;
pub use reconciliation::ReconciliationRepository;
pub use report::ReportRepository;
pub use subsidiary::{PartyType, SubsidiaryRepository};
