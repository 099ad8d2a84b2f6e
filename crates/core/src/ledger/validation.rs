//! Business rule validation for journal lines.

use rust_decimal::Decimal;
use tally_shared::types::round_money;

use super::entry::JournalLine;
use super::error::LedgerError;
use super::types::{EntryTotals, PostingLine};

/// Normalizes one requested line to a single positive side.
///
/// Amounts are rounded to money precision. A line carrying both sides is
/// netted; the larger side wins.
///
/// # Errors
///
/// Returns `InvalidLineAmount` for a negative amount or a zero net.
pub fn normalize_line(line_number: usize, line: &PostingLine) -> Result<JournalLine, LedgerError> {
    let debit = round_money(line.debit);
    let credit = round_money(line.credit);

    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(LedgerError::InvalidLineAmount {
            line: line_number,
            reason: "amounts cannot be negative".to_string(),
        });
    }

    let net = debit - credit;
    if net.is_zero() {
        return Err(LedgerError::InvalidLineAmount {
            line: line_number,
            reason: "line must carry a non-zero debit or credit".to_string(),
        });
    }

    let (debit, credit) = if net > Decimal::ZERO {
        (net, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -net)
    };

    Ok(JournalLine {
        line_number: i32::try_from(line_number).unwrap_or(i32::MAX),
        account_id: line.account_id,
        debit,
        credit,
        description: line.description.clone(),
    })
}

/// Validates a set of requested lines and returns them normalized.
///
/// # Errors
///
/// Returns an error if there are fewer than 2 lines, a line amount is
/// invalid, or debits and credits do not agree within tolerance.
pub fn validate_lines(lines: &[PostingLine]) -> Result<(Vec<JournalLine>, EntryTotals), LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines { count: lines.len() });
    }

    let normalized = lines
        .iter()
        .enumerate()
        .map(|(i, line)| normalize_line(i + 1, line))
        .collect::<Result<Vec<_>, _>>()?;

    let totals = EntryTotals::new(
        normalized.iter().map(|l| l.debit).sum(),
        normalized.iter().map(|l| l.credit).sum(),
    );

    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok((normalized, totals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn both(debit: Decimal, credit: Decimal) -> PostingLine {
        PostingLine {
            account_id: AccountId::new(),
            debit,
            credit,
            description: None,
        }
    }

    #[test]
    fn test_balanced_lines() {
        let lines = vec![
            PostingLine::debit(AccountId::new(), dec!(100)),
            PostingLine::credit(AccountId::new(), dec!(100)),
        ];
        let (normalized, totals) = validate_lines(&lines).unwrap();
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].line_number, 1);
        assert_eq!(totals.debit, dec!(100));
    }

    #[test]
    fn test_unbalanced_lines() {
        let lines = vec![
            PostingLine::debit(AccountId::new(), dec!(100)),
            PostingLine::credit(AccountId::new(), dec!(99)),
        ];
        assert_eq!(
            validate_lines(&lines),
            Err(LedgerError::UnbalancedEntry {
                debit: dec!(100),
                credit: dec!(99),
            })
        );
    }

    #[test]
    fn test_sub_cent_difference_is_balanced() {
        let lines = vec![
            PostingLine::debit(AccountId::new(), dec!(33.33)),
            PostingLine::debit(AccountId::new(), dec!(33.33)),
            PostingLine::debit(AccountId::new(), dec!(33.334)),
            PostingLine::credit(AccountId::new(), dec!(100)),
        ];
        assert!(validate_lines(&lines).is_err());

        let lines = vec![
            PostingLine::debit(AccountId::new(), dec!(50.004)),
            PostingLine::credit(AccountId::new(), dec!(50)),
        ];
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn test_insufficient_lines() {
        let lines = vec![PostingLine::debit(AccountId::new(), dec!(100))];
        assert_eq!(
            validate_lines(&lines),
            Err(LedgerError::InsufficientLines { count: 1 })
        );
    }

    #[test]
    fn test_both_sides_are_netted() {
        let line = normalize_line(1, &both(dec!(100), dec!(30))).unwrap();
        assert_eq!((line.debit, line.credit), (dec!(70), Decimal::ZERO));

        let line = normalize_line(1, &both(dec!(10), dec!(30))).unwrap();
        assert_eq!((line.debit, line.credit), (Decimal::ZERO, dec!(20)));
    }

    #[test]
    fn test_zero_net_rejected() {
        assert!(matches!(
            normalize_line(2, &both(dec!(40), dec!(40))),
            Err(LedgerError::InvalidLineAmount { line: 2, .. })
        ));
        assert!(matches!(
            normalize_line(1, &both(Decimal::ZERO, Decimal::ZERO)),
            Err(LedgerError::InvalidLineAmount { .. })
        ));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            normalize_line(1, &both(dec!(-5), Decimal::ZERO)),
            Err(LedgerError::InvalidLineAmount { .. })
        ));
    }

    #[test]
    fn test_amounts_rounded_to_cents() {
        let line = normalize_line(1, &both(dec!(10.005), Decimal::ZERO)).unwrap();
        assert_eq!(line.debit, dec!(10.01));
    }
}
