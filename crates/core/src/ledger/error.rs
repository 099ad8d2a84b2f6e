//! Ledger error types for validation and state errors.
//!
//! Every failure a collaborator can see from posting, voiding, period
//! transitions or reconciliation is one of these variants. Validation
//! variants are raised before any write begins; `PostingFailed` is raised
//! once the atomic write phase has started and means nothing was applied.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId, PeriodId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// A line amount is negative or nets to zero.
    #[error("Line {line}: {reason}")]
    InvalidLineAmount {
        /// 1-based line number.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    // ========== Account Errors ==========
    /// A line references an account that does not resolve in the company.
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    InactiveAccount(AccountId),

    /// Account lookup failed.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account code already used in the company.
    #[error("Account code already exists: {0}")]
    DuplicateAccountCode(String),

    /// Account definition rejected.
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    // ========== Period Errors ==========
    /// Date falls in a Closed period and policy forbids posting.
    #[error("Accounting period containing {0} is closed")]
    ClosedPeriod(NaiveDate),

    /// Date falls in a Locked period; never overridable.
    #[error("Accounting period containing {0} is locked")]
    LockedPeriod(NaiveDate),

    /// Period lookup failed.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(PeriodId),

    /// Period start is after its end.
    #[error("Invalid period range: {start} to {end}")]
    InvalidPeriodRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Period overlaps another period of the same type.
    #[error("Period overlaps existing period {0}")]
    OverlappingPeriod(String),

    /// Closing needs a retained earnings account.
    #[error("No active retained earnings account; cannot close period")]
    RetainedEarningsMissing,

    // ========== State Errors ==========
    /// Journal entry lookup failed.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Transition not allowed from the current state.
    #[error("Cannot {action} {entity} in status {from}")]
    InvalidTransition {
        /// Kind of thing, e.g. "journal entry".
        entity: &'static str,
        /// Current status.
        from: String,
        /// Attempted action.
        action: String,
    },

    // ========== Storage Errors ==========
    /// The atomic write phase failed; nothing was applied.
    #[error("Posting failed: {0}")]
    PostingFailed(String),
}

impl LedgerError {
    /// Convenience constructor for [`LedgerError::InvalidTransition`].
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        action: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            action: action.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::InvalidLineAmount { .. } => "INVALID_LINE_AMOUNT",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::ClosedPeriod(_) => "CLOSED_PERIOD",
            Self::LockedPeriod(_) => "LOCKED_PERIOD",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::InvalidPeriodRange { .. } => "INVALID_PERIOD_RANGE",
            Self::OverlappingPeriod(_) => "OVERLAPPING_PERIOD",
            Self::RetainedEarningsMissing => "RETAINED_EARNINGS_MISSING",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::PostingFailed(_) => "POSTING_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InsufficientLines { .. }
            | Self::InvalidLineAmount { .. }
            | Self::UnbalancedEntry { .. }
            | Self::UnknownAccount(_)
            | Self::InactiveAccount(_)
            | Self::InvalidAccount(_)
            | Self::InvalidPeriodRange { .. }
            | Self::RetainedEarningsMissing => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::PeriodNotFound(_) | Self::EntryNotFound(_) => 404,

            // 409 Conflict - state errors
            Self::DuplicateAccountCode(_)
            | Self::OverlappingPeriod(_)
            | Self::InvalidTransition { .. } => 409,

            // 423 Locked - period gate
            Self::ClosedPeriod(_) | Self::LockedPeriod(_) => 423,

            // 500 Internal Server Error
            Self::PostingFailed(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PostingFailed(_))
    }
}
