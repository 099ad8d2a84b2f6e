//! Property-based tests for line validation.
//!
//! - Property 3: Normalized Lines Are Single-Sided
//! - Property 4: Netting Preserves The Signed Amount

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::types::PostingLine;
use super::validation::{normalize_line, validate_lines};

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// **Property 3: Normalized Lines Are Single-Sided**
    ///
    /// *For any* accepted line, exactly one side SHALL be positive.
    #[test]
    fn prop_normalized_line_single_sided(debit in amount(), credit in amount()) {
        let line = PostingLine { account_id: AccountId::new(), debit, credit, description: None };
        match normalize_line(1, &line) {
            Ok(normalized) => {
                prop_assert!(
                    (normalized.debit > Decimal::ZERO) ^ (normalized.credit > Decimal::ZERO)
                );
            }
            Err(err) => {
                prop_assert_eq!(debit, credit);
                let is_amount_error = matches!(err, LedgerError::InvalidLineAmount { .. });
                prop_assert!(is_amount_error);
            }
        }
    }

    /// **Property 4: Netting Preserves The Signed Amount**
    ///
    /// *For any* accepted line, debit - credit SHALL be unchanged by netting.
    #[test]
    fn prop_netting_preserves_signed_amount(debit in amount(), credit in amount()) {
        prop_assume!(debit != credit);
        let line = PostingLine { account_id: AccountId::new(), debit, credit, description: None };
        let normalized = normalize_line(1, &line).unwrap();
        prop_assert_eq!(normalized.debit - normalized.credit, debit - credit);
    }

    /// *For any* single line, validation SHALL fail with InsufficientLines.
    #[test]
    fn prop_single_line_insufficient(debit in amount()) {
        let lines = vec![PostingLine::debit(AccountId::new(), debit)];
        prop_assert_eq!(validate_lines(&lines), Err(LedgerError::InsufficientLines { count: 1 }));
    }
}
