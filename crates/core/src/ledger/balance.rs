//! Account balance calculations.
//!
//! The normal-balance sign rule lives here and nowhere else: ledger running
//! balances, cached account balances, trial balance presentation and every
//! report convert debits and credits through [`NormalBalance::signed_delta`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::string_enum;

string_enum! {
    /// The side on which an account's balance naturally grows.
    ///
    /// - Debit-normal (Asset, Expense): balance += debit - credit
    /// - Credit-normal (Liability, Equity, Revenue): balance += credit - debit
    pub enum NormalBalance {
        /// Debit-normal account.
        Debit => "debit",
        /// Credit-normal account.
        Credit => "credit",
    }
}

impl NormalBalance {
    /// Calculates the signed balance change for a debit/credit pair.
    #[must_use]
    pub fn signed_delta(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Presents a signed balance in trial-balance columns as `(debit, credit)`.
    ///
    /// A positive balance lands on the account's natural side; a negative
    /// one flips to the opposite column as a positive amount.
    #[must_use]
    pub fn present(self, balance: Decimal) -> (Decimal, Decimal) {
        let positive = balance >= Decimal::ZERO;
        match (self, positive) {
            (Self::Debit, true) | (Self::Credit, false) => (balance.abs(), Decimal::ZERO),
            (Self::Debit, false) | (Self::Credit, true) => (Decimal::ZERO, balance.abs()),
        }
    }
}

/// Running balance information for a ledger row.
///
/// - account_version: monotonically increasing counter per account
/// - previous_balance: balance before this row
/// - current_balance: balance after this row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Account version (monotonically increasing).
    pub account_version: i64,
    /// Balance before this row.
    pub previous_balance: Decimal,
    /// Balance after this row.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Creates the running balance for the first row on an account.
    #[must_use]
    pub fn first_entry(balance_change: Decimal) -> Self {
        Self {
            account_version: 1,
            previous_balance: Decimal::ZERO,
            current_balance: balance_change,
        }
    }

    /// Creates the running balance following `previous`.
    ///
    /// - current_balance[N] = previous_balance[N] + balance_change
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, balance_change: Decimal) -> Self {
        Self {
            account_version: previous.account_version + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance + balance_change,
        }
    }

    /// Extends an optional latest row with a new change.
    #[must_use]
    pub fn extend(latest: Option<&Self>, balance_change: Decimal) -> Self {
        match latest {
            Some(previous) => Self::next_entry(previous, balance_change),
            None => Self::first_entry(balance_change),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_debit_normal_sign_rule() {
        assert_eq!(NormalBalance::Debit.signed_delta(dec!(100), Decimal::ZERO), dec!(100));
        assert_eq!(NormalBalance::Debit.signed_delta(Decimal::ZERO, dec!(40)), dec!(-40));
    }

    #[test]
    fn test_credit_normal_sign_rule() {
        assert_eq!(NormalBalance::Credit.signed_delta(Decimal::ZERO, dec!(100)), dec!(100));
        assert_eq!(NormalBalance::Credit.signed_delta(dec!(40), Decimal::ZERO), dec!(-40));
    }

    #[test]
    fn test_present_on_natural_side() {
        assert_eq!(NormalBalance::Debit.present(dec!(750)), (dec!(750), Decimal::ZERO));
        assert_eq!(NormalBalance::Credit.present(dec!(1000)), (Decimal::ZERO, dec!(1000)));
    }

    #[test]
    fn test_present_flips_negative_balance() {
        assert_eq!(NormalBalance::Debit.present(dec!(-20)), (Decimal::ZERO, dec!(20)));
        assert_eq!(NormalBalance::Credit.present(dec!(-20)), (dec!(20), Decimal::ZERO));
    }

    #[test]
    fn test_running_balance_cash_example() {
        let first = RunningBalance::first_entry(NormalBalance::Debit.signed_delta(dec!(1000), Decimal::ZERO));
        let second = RunningBalance::next_entry(
            &first,
            NormalBalance::Debit.signed_delta(Decimal::ZERO, dec!(250)),
        );
        assert_eq!(first.current_balance, dec!(1000));
        assert_eq!(second.current_balance, dec!(750));
        assert_eq!(second.account_version, 2);
    }

    /// Strategy for generating balance changes (can be positive or negative)
    fn balance_change_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// *For any* sequence of changes, the final running balance SHALL
        /// equal the sum of all changes and versions SHALL count up from 1.
        #[test]
        fn prop_running_balance_chain_sums_changes(
            changes in prop::collection::vec(balance_change_strategy(), 1..30),
        ) {
            let mut latest: Option<RunningBalance> = None;
            for change in &changes {
                let next = RunningBalance::extend(latest.as_ref(), *change);
                if let Some(prev) = latest {
                    prop_assert_eq!(next.previous_balance, prev.current_balance);
                    prop_assert_eq!(next.account_version, prev.account_version + 1);
                }
                latest = Some(next);
            }
            let last = latest.unwrap();
            prop_assert_eq!(last.current_balance, changes.iter().copied().sum::<Decimal>());
            prop_assert_eq!(last.account_version, changes.len() as i64);
        }

        /// *For any* amount, a debit and an equal credit cancel on either side.
        #[test]
        fn prop_equal_debit_and_credit_cancel(amount in balance_change_strategy()) {
            let amount = amount.abs();
            for side in NormalBalance::ALL {
                let up = side.signed_delta(amount, Decimal::ZERO);
                let down = side.signed_delta(Decimal::ZERO, amount);
                prop_assert_eq!(up + down, Decimal::ZERO);
            }
        }

        /// *For any* balance, presentation keeps exactly one column non-zero
        /// and preserves the magnitude.
        #[test]
        fn prop_present_single_column(balance in balance_change_strategy()) {
            for side in NormalBalance::ALL {
                let (debit, credit) = side.present(balance);
                prop_assert!(debit.is_zero() || credit.is_zero());
                prop_assert_eq!(debit + credit, balance.abs());
                prop_assert_eq!(side.signed_delta(debit, credit), balance);
            }
        }
    }
}
