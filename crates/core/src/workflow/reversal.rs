//! Reversal service for voiding posted entries.
//!
//! A void never rewrites history: it produces a mirrored entry whose lines
//! swap each original debit and credit, dated on the original date.

use rust_decimal::Decimal;
use tally_shared::types::{UserId, amounts_agree};

use crate::ledger::{JournalEntry, JournalLine, PostingLine, PostingRequest};

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Create reversing lines by swapping debits and credits.
    ///
    /// Accounts, amounts and line order are preserved; memos are prefixed
    /// with "Reversal: ".
    #[must_use]
    pub fn reversing_lines(lines: &[JournalLine]) -> Vec<PostingLine> {
        lines
            .iter()
            .map(|line| PostingLine {
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                description: Some(format!(
                    "Reversal: {}",
                    line.description.clone().unwrap_or_default()
                )),
            })
            .collect()
    }

    /// The posting request for the reversal of `original`.
    #[must_use]
    pub fn reversal_request(original: &JournalEntry, user_id: UserId, reason: Option<&str>) -> PostingRequest {
        let mut request = PostingRequest::new(original.company_id, user_id, original.entry_date)
            .description(format!("Reversal of {}", original.entry_number));
        if let Some(reason) = reason {
            request = request.reference(reason);
        }
        request.source_document = original.source_document;
        request.lines = Self::reversing_lines(&original.lines);
        request
    }

    /// Validate that original lines are balanced.
    ///
    /// This should always be true for posted entries.
    #[must_use]
    pub fn validate_reversal(lines: &[JournalLine]) -> bool {
        let total_debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = lines.iter().map(|l| l.credit).sum();
        lines.len() >= 2 && amounts_agree(total_debit, total_credit)
    }
}
