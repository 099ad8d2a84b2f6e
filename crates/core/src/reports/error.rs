//! Report error types.

use chrono::NaiveDate;
use tally_shared::types::AccountId;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Reading ledger data failed.
    #[error("Report storage error: {0}")]
    Storage(String),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<LedgerError> for ReportError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(id) | LedgerError::UnknownAccount(id) => {
                Self::AccountNotFound(id)
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ledger_error() {
        let id = AccountId::new();
        assert_eq!(
            ReportError::from(LedgerError::AccountNotFound(id)),
            ReportError::AccountNotFound(id)
        );
        let err = ReportError::from(LedgerError::PostingFailed("connection reset".to_string()));
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
