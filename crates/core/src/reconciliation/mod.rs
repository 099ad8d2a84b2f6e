//! Stored balance versus ledger reconciliation.
//!
//! The cached `balance` on an account is a denormalization; the ledger rows
//! are the source of truth. Drift of a cent or more is corrected, never
//! raised as an error, and reported back for audit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, amounts_agree};

use crate::ledger::Account;

/// Outcome of reconciling one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Account reconciled.
    pub account_id: AccountId,
    /// Stored balance matched the ledger.
    pub in_sync: bool,
    /// Cached balance before reconciliation.
    pub stored_balance: Decimal,
    /// Signed sum over the account's ledger rows.
    pub ledger_balance: Decimal,
    /// The cached balance was overwritten.
    pub corrected: bool,
}

impl ReconciliationResult {
    /// `stored_balance - ledger_balance`: positive when the cached balance
    /// overstates the ledger, negative when it understates it.
    #[must_use]
    pub fn drift(&self) -> Decimal {
        self.stored_balance - self.ledger_balance
    }
}

/// Aggregate outcome of reconciling every account of a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Accounts examined.
    pub total_accounts: usize,
    /// Accounts whose cached balance was corrected.
    pub reconciled_count: usize,
    /// Accounts already in sync.
    pub in_sync_count: usize,
    /// Per-account results.
    pub results: Vec<ReconciliationResult>,
}

impl ReconciliationSummary {
    /// Builds the summary from per-account results.
    #[must_use]
    pub fn from_results(results: Vec<ReconciliationResult>) -> Self {
        Self {
            total_accounts: results.len(),
            reconciled_count: results.iter().filter(|r| r.corrected).count(),
            in_sync_count: results.iter().filter(|r| r.in_sync).count(),
            results,
        }
    }
}

/// Stateless reconciliation logic.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Compares `account.balance` against its ledger totals.
    ///
    /// `ledger_debit` and `ledger_credit` are the sums over every ledger row
    /// of the account; they are converted with the account's sign rule.
    #[must_use]
    pub fn reconcile(account: &Account, ledger_debit: Decimal, ledger_credit: Decimal) -> ReconciliationResult {
        let ledger_balance = account.signed_delta(ledger_debit, ledger_credit);
        let in_sync = amounts_agree(account.balance, ledger_balance);

        ReconciliationResult {
            account_id: account.id,
            in_sync,
            stored_balance: account.balance,
            ledger_balance,
            corrected: !in_sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountType, NewAccount};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tally_shared::types::CompanyId;

    fn account(account_type: AccountType, balance: Decimal) -> Account {
        let mut account = NewAccount::new(CompanyId::new(), "1000", "Test", account_type).into_account();
        account.balance = balance;
        account
    }

    #[rstest]
    #[case(AccountType::Asset, dec!(750), dec!(1000), dec!(250), true)]
    #[case(AccountType::Asset, dec!(700), dec!(1000), dec!(250), false)]
    #[case(AccountType::Revenue, dec!(500), Decimal::ZERO, dec!(500), true)]
    #[case(AccountType::Revenue, dec!(500.005), Decimal::ZERO, dec!(500), true)]
    #[case(AccountType::Liability, dec!(0), dec!(10), Decimal::ZERO, false)]
    fn test_reconcile(
        #[case] account_type: AccountType,
        #[case] stored: Decimal,
        #[case] debit: Decimal,
        #[case] credit: Decimal,
        #[case] in_sync: bool,
    ) {
        let result = ReconciliationService::reconcile(&account(account_type, stored), debit, credit);
        assert_eq!(result.in_sync, in_sync);
        assert_eq!(result.corrected, !in_sync);
    }

    #[test]
    fn test_drift_reported() {
        let result = ReconciliationService::reconcile(&account(AccountType::Asset, dec!(700)), dec!(1000), dec!(250));
        assert_eq!(result.ledger_balance, dec!(750));
        assert_eq!(result.drift(), dec!(-50));

        let over = ReconciliationService::reconcile(&account(AccountType::Asset, dec!(800)), dec!(1000), dec!(250));
        assert_eq!(over.drift(), dec!(50));
    }

    #[test]
    fn test_summary_counts() {
        let a = ReconciliationService::reconcile(&account(AccountType::Asset, dec!(10)), dec!(10), Decimal::ZERO);
        let b = ReconciliationService::reconcile(&account(AccountType::Asset, dec!(3)), dec!(10), Decimal::ZERO);
        let summary = ReconciliationSummary::from_results(vec![a, b]);
        assert_eq!(summary.total_accounts, 2);
        assert_eq!(summary.in_sync_count, 1);
        assert_eq!(summary.reconciled_count, 1);
    }
}
