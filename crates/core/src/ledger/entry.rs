//! Journal entries and ledger rows.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, CompanyId, DocumentId, JournalEntryId, LedgerRowId, PeriodId, UserId,
};

use super::types::EntryTotals;
use crate::string_enum;

string_enum! {
    /// Journal entry lifecycle status.
    pub enum EntryStatus {
        /// Recorded but not yet posted; no ledger rows exist.
        Draft => "draft",
        /// Posted to the ledger (immutable).
        Posted => "posted",
        /// Reversed by a mirrored entry (immutable).
        Void => "void",
    }
}

string_enum! {
    /// Kind of business document that produced an entry.
    pub enum SourceDocumentType {
        /// Sales invoice.
        Invoice => "invoice",
        /// Supplier bill.
        Bill => "bill",
        /// Incoming or outgoing payment.
        Payment => "payment",
        /// Credit note.
        CreditNote => "credit_note",
        /// Manual journal.
        Manual => "manual",
    }
}

/// Reference to the document owned by a collaborating module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document kind.
    pub doc_type: SourceDocumentType,
    /// Document ID in the owning module.
    pub id: DocumentId,
}

impl SourceDocument {
    /// Creates a document reference.
    #[must_use]
    pub const fn new(doc_type: SourceDocumentType, id: DocumentId) -> Self {
        Self { doc_type, id }
    }
}

/// One line of a journal entry, already normalized to a single side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// 1-based position within the entry.
    pub line_number: i32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount (>= 0).
    pub debit: Decimal,
    /// Credit amount (>= 0).
    pub credit: Decimal,
    /// Line memo.
    pub description: Option<String>,
}

/// A journal entry with its ordered lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Human-readable number, e.g. `JE-2026-0001`.
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// External reference.
    pub reference_number: Option<String>,
    /// Narrative.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Originating document.
    pub source_document: Option<SourceDocument>,
    /// Lines, in posting order.
    pub lines: Vec<JournalLine>,
    /// Set on a reversal: the entry it reverses.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// Set on a voided entry: its reversal.
    pub reversed_by_entry_id: Option<JournalEntryId>,
    /// Set on closing entries: the period they close.
    pub closing_period_id: Option<PeriodId>,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Posting time.
    pub posted_at: Option<DateTime<Utc>>,
    /// Void time.
    pub voided_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Debit and credit totals over all lines.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::new(
            self.lines.iter().map(|l| l.debit).sum(),
            self.lines.iter().map(|l| l.credit).sum(),
        )
    }
}

/// One append-only ledger row: a posted line with its account running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Row ID.
    pub id: LedgerRowId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Account.
    pub account_id: AccountId,
    /// Source entry.
    pub journal_entry_id: JournalEntryId,
    /// Line number within the source entry.
    pub line_number: i32,
    /// Per-account insertion counter.
    pub account_version: i64,
    /// Accounting date of the source entry.
    pub entry_date: NaiveDate,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Account balance after this row.
    pub running_balance: Decimal,
    /// Line memo.
    pub description: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(n: i32, debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            line_number: n,
            account_id: AccountId::new(),
            debit,
            credit,
            description: None,
        }
    }

    #[test]
    fn test_entry_totals() {
        let entry = JournalEntry {
            id: JournalEntryId::new(),
            company_id: CompanyId::new(),
            entry_number: "JE-2026-0001".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            reference_number: None,
            description: None,
            status: EntryStatus::Posted,
            source_document: None,
            lines: vec![
                line(1, dec!(100), Decimal::ZERO),
                line(2, Decimal::ZERO, dec!(60)),
                line(3, Decimal::ZERO, dec!(40)),
            ],
            reverses_entry_id: None,
            reversed_by_entry_id: None,
            closing_period_id: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
            posted_at: None,
            voided_at: None,
        };
        let totals = entry.totals();
        assert_eq!(totals.debit, dec!(100));
        assert_eq!(totals.credit, dec!(100));
        assert!(totals.is_balanced());
    }
}
