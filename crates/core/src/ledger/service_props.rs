//! Property-based tests for LedgerService.
//!
//! - Property 1: Entry Balance Integrity
//! - Property 2: Row Plan Agrees With Balance Deltas

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CompanyId, UserId};

use super::account::{Account, AccountType, NewAccount};
use super::balance::RunningBalance;
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{PostingLine, PostingRequest};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop::sample::select(AccountType::ALL.to_vec())
}

/// A small chart of accounts for one company.
fn chart(company_id: CompanyId, types: &[AccountType]) -> Vec<Account> {
    types
        .iter()
        .enumerate()
        .map(|(i, t)| NewAccount::new(company_id, format!("{}", 1000 + i), "Prop", *t).into_account())
        .collect()
}

/// Builds a balanced request: every debit amount is mirrored by one credit
/// total on the last account.
fn balanced_request(company_id: CompanyId, accounts: &[Account], debits: &[Decimal]) -> PostingRequest {
    let mut request = PostingRequest::new(
        company_id,
        UserId::new(),
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
    );
    let last = accounts.len() - 1;
    for (i, amount) in debits.iter().enumerate() {
        request.lines.push(PostingLine::debit(accounts[i % last].id, *amount));
    }
    request
        .lines
        .push(PostingLine::credit(accounts[last].id, debits.iter().copied().sum()));
    request
}

fn by_id(accounts: &[Account]) -> HashMap<AccountId, Account> {
    accounts.iter().map(|a| (a.id, a.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Entry Balance Integrity**
    ///
    /// *For any* validated entry, total debits SHALL equal total credits,
    /// and shifting one line by a cent or more SHALL be rejected.
    #[test]
    fn prop_balanced_entries_validate(
        types in prop::collection::vec(account_type(), 2..6),
        debits in prop::collection::vec(positive_amount(), 1..8),
        skew in 1i64..10_000i64,
    ) {
        let company = CompanyId::new();
        let accounts = chart(company, &types);
        let map = by_id(&accounts);

        let request = balanced_request(company, &accounts, &debits);
        let validated = LedgerService::validate(&request, &map).unwrap();
        prop_assert_eq!(validated.totals.debit, validated.totals.credit);

        let mut skewed = request.clone();
        skewed.lines[0].debit += Decimal::new(skew, 2);
        let is_unbalanced = matches!(
            LedgerService::validate(&skewed, &map),
            Err(LedgerError::UnbalancedEntry { .. })
        );
        prop_assert!(is_unbalanced);
    }

    /// **Property 2: Row Plan Agrees With Balance Deltas**
    ///
    /// *For any* entry and any prior balances, each account's last planned
    /// running balance SHALL equal its prior balance plus its delta, and
    /// versions SHALL continue from the prior version.
    #[test]
    fn prop_row_plan_matches_deltas(
        types in prop::collection::vec(account_type(), 2..6),
        debits in prop::collection::vec(positive_amount(), 1..8),
        priors in prop::collection::vec(prop::option::of(positive_amount()), 6),
    ) {
        let company = CompanyId::new();
        let accounts = chart(company, &types);
        let map = by_id(&accounts);

        let latest: HashMap<AccountId, RunningBalance> = accounts
            .iter()
            .zip(priors.iter())
            .filter_map(|(a, p)| p.map(|amount| (a.id, RunningBalance::first_entry(amount))))
            .collect();

        let request = balanced_request(company, &accounts, &debits);
        let validated = LedgerService::validate(&request, &map).unwrap();
        let plan = LedgerService::plan_rows(&validated.lines, &map, &latest).unwrap();

        prop_assert_eq!(plan.rows.len(), validated.lines.len());

        for (account_id, delta) in &plan.deltas {
            let prior = latest.get(account_id);
            let last_row = plan.rows.iter().rev().find(|r| r.account_id == *account_id).unwrap();
            let prior_balance = prior.map_or(Decimal::ZERO, |r| r.current_balance);
            prop_assert_eq!(last_row.running.current_balance, prior_balance + *delta);

            let rows_for_account = plan.rows.iter().filter(|r| r.account_id == *account_id).count();
            let prior_version = prior.map_or(0, |r| r.account_version);
            prop_assert_eq!(last_row.running.account_version, prior_version + rows_for_account as i64);
        }
    }
}
