//! Posting request and receipt types.
//!
//! A [`PostingRequest`] is the one strongly-typed shape collaborators use to
//! hand a document's lines to the ledger. It is validated once by
//! [`super::service::LedgerService::validate`] before any write begins.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CompanyId, JournalEntryId, UserId, amounts_agree};

use super::entry::{EntryStatus, SourceDocument};

/// A requested line. Amounts are not yet normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line memo.
    pub description: Option<String>,
}

impl PostingLine {
    /// A pure debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    /// A pure credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Whether a request should land in the ledger immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDisposition {
    /// Post now.
    #[default]
    Posted,
    /// Store as a draft without ledger rows.
    Draft,
}

impl EntryDisposition {
    /// Status the stored entry starts in.
    #[must_use]
    pub const fn initial_status(self) -> EntryStatus {
        match self {
            Self::Posted => EntryStatus::Posted,
            Self::Draft => EntryStatus::Draft,
        }
    }
}

/// Inbound post request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Tenant.
    pub company_id: CompanyId,
    /// Acting user.
    pub user_id: UserId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// External reference.
    pub reference_number: Option<String>,
    /// Narrative.
    pub description: Option<String>,
    /// Requested lines.
    pub lines: Vec<PostingLine>,
    /// Originating document.
    pub source_document: Option<SourceDocument>,
    /// Posted or Draft.
    #[serde(default)]
    pub disposition: EntryDisposition,
}

impl PostingRequest {
    /// Creates a request with no lines.
    #[must_use]
    pub fn new(company_id: CompanyId, user_id: UserId, entry_date: NaiveDate) -> Self {
        Self {
            company_id,
            user_id,
            entry_date,
            reference_number: None,
            description: None,
            lines: Vec::new(),
            source_document: None,
            disposition: EntryDisposition::Posted,
        }
    }

    /// Appends a line.
    #[must_use]
    pub fn line(mut self, line: PostingLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Sets the narrative.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the external reference.
    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    /// Links the originating document.
    #[must_use]
    pub fn source(mut self, document: SourceDocument) -> Self {
        self.source_document = Some(document);
        self
    }

    /// Stores the entry as a draft.
    #[must_use]
    pub fn as_draft(mut self) -> Self {
        self.disposition = EntryDisposition::Draft;
        self
    }
}

/// Non-fatal condition reported with a successful posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostingWarning {
    /// The entry date falls inside a Closed period and policy allowed it.
    PostedIntoClosedPeriod {
        /// The entry date.
        date: NaiveDate,
    },
}

/// Result of a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReceipt {
    /// Created entry.
    pub entry_id: JournalEntryId,
    /// Allocated entry number.
    pub entry_number: String,
    /// Resulting status.
    pub status: EntryStatus,
    /// Warnings raised while posting.
    pub warnings: Vec<PostingWarning>,
}

/// Inbound void request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoidRequest {
    /// Tenant.
    pub company_id: CompanyId,
    /// Entry to void.
    pub journal_entry_id: JournalEntryId,
    /// Acting user.
    pub user_id: UserId,
    /// Optional reason, stored on the reversal's reference.
    pub reason: Option<String>,
}

impl VoidRequest {
    /// Creates a void request.
    #[must_use]
    pub const fn new(company_id: CompanyId, journal_entry_id: JournalEntryId, user_id: UserId) -> Self {
        Self {
            company_id,
            journal_entry_id,
            user_id,
            reason: None,
        }
    }
}

/// Result of a successful void.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidReceipt {
    /// The entry now marked Void.
    pub voided_entry_id: JournalEntryId,
    /// The mirrored entry.
    pub reversal_entry_id: JournalEntryId,
    /// Number of the mirrored entry.
    pub reversal_entry_number: String,
    /// Warnings raised while posting the reversal.
    pub warnings: Vec<PostingWarning>,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Total debits.
    pub debit: Decimal,
    /// Total credits.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Creates totals.
    #[must_use]
    pub const fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// Returns true if debits and credits agree within tolerance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        amounts_agree(self.debit, self.credit)
    }

    /// Debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_builder() {
        let cash = AccountId::new();
        let equity = AccountId::new();
        let request = PostingRequest::new(
            CompanyId::new(),
            UserId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        )
        .description("Owner investment")
        .line(PostingLine::debit(cash, dec!(500)))
        .line(PostingLine::credit(equity, dec!(500)).with_description("capital"));

        assert_eq!(request.lines.len(), 2);
        assert_eq!(request.disposition, EntryDisposition::Posted);
        assert_eq!(request.lines[1].description.as_deref(), Some("capital"));
        assert_eq!(request.as_draft().disposition.initial_status(), EntryStatus::Draft);
    }

    #[test]
    fn test_totals_tolerance() {
        assert!(EntryTotals::new(dec!(100.00), dec!(100.009)).is_balanced());
        assert!(!EntryTotals::new(dec!(100), dec!(99)).is_balanced());
        assert_eq!(EntryTotals::new(dec!(100), dec!(99)).difference(), dec!(1));
    }
}
