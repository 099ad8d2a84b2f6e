//! Period-end closing entries.
//!
//! Closing zeroes every Revenue and Expense balance into the retained
//! earnings account as of the period end date.

use rust_decimal::Decimal;
use tally_shared::types::UserId;

use super::period::AccountingPeriod;
use crate::ledger::{Account, PostingLine, PostingRequest};

/// Builds closing entries.
pub struct ClosingService;

impl ClosingService {
    /// Lines that zero each income-statement balance into `retained_earnings`.
    ///
    /// `balances` pairs accounts with their signed balance as of the period
    /// end. Balance-sheet accounts and zero balances are ignored. Returns an
    /// empty vector when nothing needs closing.
    #[must_use]
    pub fn closing_lines(balances: &[(Account, Decimal)], retained_earnings: &Account) -> Vec<PostingLine> {
        let mut lines: Vec<PostingLine> = balances
            .iter()
            .filter(|(account, balance)| account.account_type.is_income_statement() && !balance.is_zero())
            .map(|(account, balance)| {
                // Post the natural-side amount on the opposite column.
                let (debit, credit) = account.normal_balance.present(*balance);
                PostingLine {
                    account_id: account.id,
                    debit: credit,
                    credit: debit,
                    description: Some(format!("Close {} {}", account.code, account.name)),
                }
            })
            .collect();

        if lines.is_empty() {
            return lines;
        }

        let net: Decimal = lines.iter().map(|l| l.debit - l.credit).sum();
        if !net.is_zero() {
            let line = if net > Decimal::ZERO {
                PostingLine::credit(retained_earnings.id, net)
            } else {
                PostingLine::debit(retained_earnings.id, -net)
            };
            lines.push(line.with_description("Net result to retained earnings"));
        }

        lines
    }

    /// The closing entry request for `period`, or `None` if nothing to close.
    #[must_use]
    pub fn closing_request(
        period: &AccountingPeriod,
        user_id: UserId,
        balances: &[(Account, Decimal)],
        retained_earnings: &Account,
    ) -> Option<PostingRequest> {
        let lines = Self::closing_lines(balances, retained_earnings);
        if lines.is_empty() {
            return None;
        }

        let mut request = PostingRequest::new(period.company_id, user_id, period.end_date)
            .description(format!("Closing entry for {}", period.name))
            .reference(format!("CLOSE-{}", period.name));
        request.lines = lines;
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::validation::validate_lines;
    use crate::ledger::{AccountSubtype, AccountType, NewAccount};
    use rust_decimal_macros::dec;
    use tally_shared::types::CompanyId;

    fn account(company: CompanyId, code: &str, account_type: AccountType) -> Account {
        NewAccount::new(company, code, code, account_type).into_account()
    }

    #[test]
    fn test_profit_closes_to_retained_credit() {
        let company = CompanyId::new();
        let revenue = account(company, "4000", AccountType::Revenue);
        let expense = account(company, "5000", AccountType::Expense);
        let cash = account(company, "1000", AccountType::Asset);
        let retained = NewAccount::new(company, "3100", "Retained", AccountType::Equity)
            .with_subtype(AccountSubtype::RetainedEarnings)
            .into_account();

        let lines = ClosingService::closing_lines(
            &[
                (revenue.clone(), dec!(1200)),
                (expense.clone(), dec!(250)),
                (cash, dec!(950)),
            ],
            &retained,
        );

        assert_eq!(lines.len(), 3);
        assert_eq!((lines[0].account_id, lines[0].debit), (revenue.id, dec!(1200)));
        assert_eq!((lines[1].account_id, lines[1].credit), (expense.id, dec!(250)));
        assert_eq!((lines[2].account_id, lines[2].credit), (retained.id, dec!(950)));
        assert!(validate_lines(&lines).is_ok());

        for (line, (acct, balance)) in lines.iter().zip([(revenue, dec!(1200)), (expense, dec!(250))]) {
            assert_eq!(acct.signed_delta(line.debit, line.credit), -balance);
        }
    }

    #[test]
    fn test_loss_closes_to_retained_debit() {
        let company = CompanyId::new();
        let revenue = account(company, "4000", AccountType::Revenue);
        let expense = account(company, "5000", AccountType::Expense);
        let retained = account(company, "3100", AccountType::Equity);

        let lines = ClosingService::closing_lines(
            &[(revenue, dec!(100)), (expense, dec!(300))],
            &retained,
        );
        let last = lines.last().unwrap();
        assert_eq!(last.account_id, retained.id);
        assert_eq!(last.debit, dec!(200));
    }

    #[test]
    fn test_nothing_to_close() {
        let company = CompanyId::new();
        let revenue = account(company, "4000", AccountType::Revenue);
        let retained = account(company, "3100", AccountType::Equity);
        assert!(ClosingService::closing_lines(&[(revenue, Decimal::ZERO)], &retained).is_empty());
    }
}
