//! Re-exports of every entity.

pub use super::accounting_periods::Entity as AccountingPeriods;
pub use super::accounts::Entity as Accounts;
pub use super::companies::Entity as Companies;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_lines::Entity as JournalLines;
pub use super::journal_sequences::Entity as JournalSequences;
pub use super::ledger_rows::Entity as LedgerRows;
pub use super::party_balances::Entity as PartyBalances;
