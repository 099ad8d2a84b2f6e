//! Company-wide posting policy.

use tally_shared::config::{ClosedPeriodPolicy, LedgerConfig};

/// Posting rules applied by the engine, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingPolicy {
    /// Entry number prefix.
    pub entry_number_prefix: String,
    /// What to do with dates in Closed periods.
    pub closed_period: ClosedPeriodPolicy,
}

impl Default for PostingPolicy {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for PostingPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            entry_number_prefix: config.entry_number_prefix.clone(),
            closed_period: config.closed_period_policy,
        }
    }
}

impl PostingPolicy {
    /// Same policy, refusing Closed periods.
    #[must_use]
    pub fn rejecting_closed_periods(mut self) -> Self {
        self.closed_period = ClosedPeriodPolicy::Reject;
        self
    }
}
