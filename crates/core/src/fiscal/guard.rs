//! Period gate applied to postings and voids.

use chrono::NaiveDate;
use tally_shared::config::ClosedPeriodPolicy;

use super::period::PeriodClassification;
use crate::ledger::{LedgerError, PostingWarning};

/// Decides whether a date may receive postings.
pub struct PeriodGuard;

impl PeriodGuard {
    /// Checks a classified date against the closed-period policy.
    ///
    /// - NoPeriod and Open: allowed
    /// - Closed: allowed with a warning, or refused under `Reject`
    /// - Locked: always refused
    ///
    /// # Errors
    ///
    /// Returns `LockedPeriod` or `ClosedPeriod`.
    pub fn check(
        classification: PeriodClassification,
        date: NaiveDate,
        policy: ClosedPeriodPolicy,
    ) -> Result<Option<PostingWarning>, LedgerError> {
        match (classification, policy) {
            (PeriodClassification::NoPeriod | PeriodClassification::Open, _) => Ok(None),
            (PeriodClassification::Closed, ClosedPeriodPolicy::Allow) => {
                Ok(Some(PostingWarning::PostedIntoClosedPeriod { date }))
            }
            (PeriodClassification::Closed, ClosedPeriodPolicy::Reject) => {
                Err(LedgerError::ClosedPeriod(date))
            }
            (PeriodClassification::Locked, _) => Err(LedgerError::LockedPeriod(date)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[rstest]
    #[case(PeriodClassification::NoPeriod, ClosedPeriodPolicy::Reject)]
    #[case(PeriodClassification::Open, ClosedPeriodPolicy::Reject)]
    #[case(PeriodClassification::Open, ClosedPeriodPolicy::Allow)]
    fn test_open_dates_pass_silently(
        #[case] classification: PeriodClassification,
        #[case] policy: ClosedPeriodPolicy,
    ) {
        assert_eq!(PeriodGuard::check(classification, day(), policy), Ok(None));
    }

    #[test]
    fn test_closed_period_follows_policy() {
        assert_eq!(
            PeriodGuard::check(PeriodClassification::Closed, day(), ClosedPeriodPolicy::Allow),
            Ok(Some(PostingWarning::PostedIntoClosedPeriod { date: day() }))
        );
        assert_eq!(
            PeriodGuard::check(PeriodClassification::Closed, day(), ClosedPeriodPolicy::Reject),
            Err(LedgerError::ClosedPeriod(day()))
        );
    }

    #[rstest]
    #[case(ClosedPeriodPolicy::Allow)]
    #[case(ClosedPeriodPolicy::Reject)]
    fn test_locked_always_refused(#[case] policy: ClosedPeriodPolicy) {
        assert_eq!(
            PeriodGuard::check(PeriodClassification::Locked, day(), policy),
            Err(LedgerError::LockedPeriod(day()))
        );
    }
}
