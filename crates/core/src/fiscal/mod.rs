//! Accounting periods, the period guard and period-end closing.

pub mod closing;
pub mod guard;
pub mod period;

pub use closing::ClosingService;
pub use guard::PeriodGuard;
pub use period::{
    AccountingPeriod, NewPeriod, PeriodAction, PeriodClassification, PeriodStatus, PeriodType,
    classify, date_ranges_overlap,
};
