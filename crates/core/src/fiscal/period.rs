//! Accounting period types and the period state machine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CompanyId, PeriodId};

use crate::ledger::LedgerError;
use crate::string_enum;

string_enum! {
    /// Period granularity.
    pub enum PeriodType {
        /// One calendar month.
        Monthly => "monthly",
        /// One quarter.
        Quarterly => "quarterly",
        /// One fiscal year.
        Annual => "annual",
    }
}

string_enum! {
    /// Status of an accounting period.
    ///
    /// Open -> Closed -> (Locked | reopen -> Open). Locked is terminal.
    pub enum PeriodStatus {
        /// Postings allowed.
        Open => "open",
        /// Closing entries posted; postings follow the closed-period policy.
        Closed => "closed",
        /// Terminal; no postings, no transitions.
        Locked => "locked",
    }
}

string_enum! {
    /// A requested period transition.
    pub enum PeriodAction {
        /// Open -> Closed.
        Close => "close",
        /// Closed -> Open.
        Reopen => "reopen",
        /// Closed -> Locked.
        Lock => "lock",
        /// Removes an Open period.
        Delete => "delete",
    }
}

impl PeriodStatus {
    /// Applies a transition.
    ///
    /// Returns the next status, or `None` when the period is deleted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the action is not allowed from `self`.
    pub fn apply(self, action: PeriodAction) -> Result<Option<Self>, LedgerError> {
        match (self, action) {
            (Self::Open, PeriodAction::Close) => Ok(Some(Self::Closed)),
            (Self::Closed, PeriodAction::Reopen) => Ok(Some(Self::Open)),
            (Self::Closed, PeriodAction::Lock) => Ok(Some(Self::Locked)),
            (Self::Open, PeriodAction::Delete) => Ok(None),
            _ => Err(LedgerError::invalid_transition("accounting period", self, action)),
        }
    }

    /// Restrictiveness rank used when several periods contain a date.
    const fn rank(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closed => 1,
            Self::Locked => 2,
        }
    }
}

/// An accounting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Period ID.
    pub id: PeriodId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name, e.g. "January 2026".
    pub name: String,
    /// Fiscal year label.
    pub fiscal_year: i32,
    /// Granularity.
    pub period_type: PeriodType,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
}

impl AccountingPeriod {
    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Input for creating a period.
#[derive(Debug, Clone)]
pub struct NewPeriod {
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Fiscal year label.
    pub fiscal_year: i32,
    /// Granularity.
    pub period_type: PeriodType,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
}

impl NewPeriod {
    /// Validates the range and that no period of the same type overlaps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange` or `OverlappingPeriod`.
    pub fn validate(&self, existing: &[AccountingPeriod]) -> Result<(), LedgerError> {
        if self.start_date > self.end_date {
            return Err(LedgerError::InvalidPeriodRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if let Some(clash) = existing.iter().find(|p| {
            p.period_type == self.period_type
                && date_ranges_overlap(self.start_date, self.end_date, p.start_date, p.end_date)
        }) {
            return Err(LedgerError::OverlappingPeriod(clash.name.clone()));
        }

        Ok(())
    }
}

/// Checks if two date ranges overlap (inclusive on both ends).
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Outcome of classifying a date against a company's periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodClassification {
    /// No period contains the date.
    NoPeriod,
    /// Most restrictive containing period is Open.
    Open,
    /// Most restrictive containing period is Closed.
    Closed,
    /// Most restrictive containing period is Locked.
    Locked,
}

impl From<PeriodStatus> for PeriodClassification {
    fn from(status: PeriodStatus) -> Self {
        match status {
            PeriodStatus::Open => Self::Open,
            PeriodStatus::Closed => Self::Closed,
            PeriodStatus::Locked => Self::Locked,
        }
    }
}

/// Classifies `date` against `periods`; the most restrictive match wins.
#[must_use]
pub fn classify(periods: &[AccountingPeriod], date: NaiveDate) -> PeriodClassification {
    periods
        .iter()
        .filter(|p| p.contains_date(date))
        .map(|p| p.status)
        .max_by_key(|s| s.rank())
        .map_or(PeriodClassification::NoPeriod, PeriodClassification::from)
}
