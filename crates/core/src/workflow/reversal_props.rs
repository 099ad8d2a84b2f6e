//! Property-based tests for ReversalService.
//!
//! - Property 7: Void Nets To Zero
//! - Property 8: Reversal Of A Reversal Restores The Original

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CompanyId};

use crate::ledger::validation::validate_lines;
use crate::ledger::{Account, AccountType, JournalLine, NewAccount, PostingLine};
use crate::workflow::reversal::ReversalService;

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_account_type() -> impl Strategy<Value = AccountType> {
    prop::sample::select(AccountType::ALL.to_vec())
}

/// Balanced lines: N debits over random accounts, one credit for the total.
fn arb_balanced_lines() -> impl Strategy<Value = (Vec<Account>, Vec<JournalLine>)> {
    (
        prop::collection::vec(arb_account_type(), 2..5),
        prop::collection::vec(arb_amount(), 1..6),
    )
        .prop_map(|(types, amounts)| {
            let company = CompanyId::new();
            let accounts: Vec<Account> = types
                .iter()
                .map(|t| NewAccount::new(company, "X", "X", *t).into_account())
                .collect();
            let last = accounts.len() - 1;
            let mut lines: Vec<PostingLine> = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| PostingLine::debit(accounts[i % last].id, *a))
                .collect();
            lines.push(PostingLine::credit(accounts[last].id, amounts.iter().copied().sum()));
            let (normalized, _) = validate_lines(&lines).unwrap();
            (accounts, normalized)
        })
}

fn net_for(account: &Account, debit_credit: impl Iterator<Item = (AccountId, Decimal, Decimal)>) -> Decimal {
    debit_credit
        .filter(|(id, _, _)| *id == account.id)
        .map(|(_, d, c)| account.signed_delta(d, c))
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 7: Void Nets To Zero**
    ///
    /// *For any* posted entry J and its reversal J', the net effect of J+J'
    /// on every touched account SHALL be zero.
    #[test]
    fn prop_void_nets_to_zero((accounts, lines) in arb_balanced_lines()) {
        prop_assert!(ReversalService::validate_reversal(&lines));
        let reversal = ReversalService::reversing_lines(&lines);
        prop_assert!(validate_lines(&reversal).is_ok());

        for account in &accounts {
            let original = net_for(account, lines.iter().map(|l| (l.account_id, l.debit, l.credit)));
            let mirrored = net_for(account, reversal.iter().map(|l| (l.account_id, l.debit, l.credit)));
            prop_assert_eq!(original + mirrored, Decimal::ZERO);
        }
    }

    /// **Property 8: Reversal Of A Reversal Restores The Original**
    #[test]
    fn prop_double_reversal_restores((_accounts, lines) in arb_balanced_lines()) {
        let once = ReversalService::reversing_lines(&lines);
        let (once_normalized, _) = validate_lines(&once).unwrap();
        let twice = ReversalService::reversing_lines(&once_normalized);

        for (original, restored) in lines.iter().zip(twice.iter()) {
            prop_assert_eq!(original.account_id, restored.account_id);
            prop_assert_eq!(original.debit, restored.debit);
            prop_assert_eq!(original.credit, restored.credit);
        }
    }
}
