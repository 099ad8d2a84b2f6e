//! Report generation service.
//!
//! Every function here is a pure derivation over [`AccountActivity`]; the
//! caller decides the window (as-of or range) and whether closing entries
//! are included.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::amounts_agree;

use super::types::{
    AccountActivity, AccountLedgerReport, AccountingEquation, BalanceSheetGroup,
    BalanceSheetReport, BalanceSheetSection, CashFlowReport, CashFlowSummary, DateRange,
    ExpenseSection, IncomeStatementReport, OperatingActivities, ReportLine, ReportSection,
    RevenueSection, TrialBalanceLine, TrialBalanceReport,
};
use crate::ledger::{Account, AccountSubtype, AccountType, CashFlowCategory, LedgerRow};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance from cumulative activity as of `as_of`.
    ///
    /// Each account with activity is shown on its natural side; a negative
    /// balance flips to the opposite column.
    #[must_use]
    pub fn trial_balance(as_of: NaiveDate, activity: &[AccountActivity]) -> TrialBalanceReport {
        let mut lines: Vec<TrialBalanceLine> = activity
            .iter()
            .filter(|a| !a.is_empty())
            .map(|a| {
                let (debit, credit) = a.account.normal_balance.present(a.balance());
                TrialBalanceLine {
                    account_id: a.account.id,
                    code: a.account.code.clone(),
                    name: a.account.name.clone(),
                    account_type: a.account.account_type,
                    debit,
                    credit,
                }
            })
            .collect();
        lines.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = lines.iter().map(|l| l.credit).sum();

        TrialBalanceReport {
            as_of,
            lines,
            total_debit,
            total_credit,
            balanced: amounts_agree(total_debit, total_credit),
        }
    }

    /// Generates a balance sheet from cumulative activity as of `as_of`.
    ///
    /// Revenue and expense not yet closed appear in equity as "Current
    /// earnings", so the equation holds before and after closing.
    #[must_use]
    pub fn balance_sheet(as_of: NaiveDate, activity: &[AccountActivity]) -> BalanceSheetReport {
        let mut current_assets = ReportSection::default();
        let mut fixed_assets = ReportSection::default();
        let mut other_assets = ReportSection::default();
        let mut current_liabilities = ReportSection::default();
        let mut long_term_liabilities = ReportSection::default();
        let mut other_liabilities = ReportSection::default();
        let mut equity_lines = ReportSection::default();
        let mut current_earnings = Decimal::ZERO;

        for a in sorted(activity).into_iter().filter(|a| !a.is_empty()) {
            let account = &a.account;
            match account.account_type {
                AccountType::Asset => {
                    let line = ReportLine::for_account(account, a.balance_as(AccountType::Asset));
                    match account.subtype {
                        Some(s) if s.is_current() => current_assets.push(line),
                        Some(AccountSubtype::FixedAsset) => fixed_assets.push(line),
                        _ => other_assets.push(line),
                    }
                }
                AccountType::Liability => {
                    let line = ReportLine::for_account(account, a.balance_as(AccountType::Liability));
                    match account.subtype {
                        Some(s) if s.is_current() => current_liabilities.push(line),
                        Some(AccountSubtype::LongTermLiability) => long_term_liabilities.push(line),
                        _ => other_liabilities.push(line),
                    }
                }
                AccountType::Equity => {
                    equity_lines.push(ReportLine::for_account(account, a.balance_as(AccountType::Equity)));
                }
                AccountType::Revenue => current_earnings += a.balance_as(AccountType::Revenue),
                AccountType::Expense => current_earnings -= a.balance_as(AccountType::Expense),
            }
        }

        if !current_earnings.is_zero() {
            equity_lines.push(ReportLine::computed("Current earnings", current_earnings));
        }

        let assets = section(vec![
            ("Current assets", current_assets),
            ("Fixed assets", fixed_assets),
            ("Other assets", other_assets),
        ]);
        let liabilities = section(vec![
            ("Current liabilities", current_liabilities),
            ("Long-term liabilities", long_term_liabilities),
            ("Other liabilities", other_liabilities),
        ]);
        let equity = section(vec![("Equity", equity_lines)]);

        let equation = AccountingEquation {
            assets: assets.total,
            liabilities: liabilities.total,
            equity: equity.total,
            difference: assets.total - (liabilities.total + equity.total),
        };

        BalanceSheetReport {
            as_of,
            assets,
            liabilities,
            equity,
            balanced: amounts_agree(equation.difference, Decimal::ZERO),
            equation,
        }
    }

    /// Generates an income statement from activity strictly within `range`.
    #[must_use]
    pub fn income_statement(range: DateRange, activity: &[AccountActivity]) -> IncomeStatementReport {
        let mut revenue = RevenueSection::default();
        let mut expenses = ExpenseSection::default();

        for a in sorted(activity).into_iter().filter(|a| !a.is_empty()) {
            let account = &a.account;
            match account.account_type {
                AccountType::Revenue => {
                    let line = ReportLine::for_account(account, a.balance_as(AccountType::Revenue));
                    match account.subtype {
                        Some(AccountSubtype::OtherIncome) => revenue.other.push(line),
                        _ => revenue.operating.push(line),
                    }
                }
                AccountType::Expense => {
                    let line = ReportLine::for_account(account, a.balance_as(AccountType::Expense));
                    match account.subtype {
                        Some(AccountSubtype::CostOfGoodsSold) => expenses.cost_of_goods_sold.push(line),
                        Some(AccountSubtype::OtherExpense) => expenses.other.push(line),
                        _ => expenses.operating.push(line),
                    }
                }
                AccountType::Asset | AccountType::Liability | AccountType::Equity => {}
            }
        }

        revenue.total = revenue.operating.total + revenue.other.total;
        expenses.total =
            expenses.cost_of_goods_sold.total + expenses.operating.total + expenses.other.total;

        let gross_profit = revenue.operating.total - expenses.cost_of_goods_sold.total;
        let operating_income = gross_profit - expenses.operating.total;
        let net_income = revenue.total - expenses.total;

        IncomeStatementReport {
            range,
            revenue,
            expenses,
            gross_profit,
            operating_income,
            net_income,
        }
    }

    /// Generates a cash flow statement (indirect method).
    ///
    /// `activity` covers the range without closing entries. The cash effect
    /// of a non-cash balance-sheet account is its credits minus its debits.
    #[must_use]
    pub fn cash_flow(
        range: DateRange,
        activity: &[AccountActivity],
        beginning_cash: Decimal,
        ending_cash: Decimal,
    ) -> CashFlowReport {
        let net_income = Self::income_statement(range, activity).net_income;

        let mut adjustments = ReportSection::default();
        let mut investing = ReportSection::default();
        let mut financing = ReportSection::default();

        for a in sorted(activity) {
            let account = &a.account;
            if !account.account_type.is_balance_sheet() || account.is_cash() || a.is_empty() {
                continue;
            }
            let effect = a.total_credit - a.total_debit;
            if effect.is_zero() {
                continue;
            }
            let line = ReportLine::for_account(account, effect);
            match account.effective_cash_flow_category() {
                CashFlowCategory::Operating => adjustments.push(line),
                CashFlowCategory::Investing => investing.push(line),
                CashFlowCategory::Financing => financing.push(line),
            }
        }

        let operating = OperatingActivities {
            net_income,
            total: net_income + adjustments.total,
            adjustments,
        };
        let net_cash_flow = operating.total + investing.total + financing.total;
        let calculated_ending_cash = beginning_cash + net_cash_flow;

        CashFlowReport {
            range,
            operating,
            investing,
            financing,
            summary: CashFlowSummary {
                beginning_cash,
                net_cash_flow,
                calculated_ending_cash,
                ending_cash,
                reconciles: amounts_agree(calculated_ending_cash, ending_cash),
            },
        }
    }

    /// Cash balance from cumulative activity.
    #[must_use]
    pub fn cash_balance(activity: &[AccountActivity]) -> Decimal {
        activity
            .iter()
            .filter(|a| a.account.is_cash())
            .map(|a| a.balance_as(AccountType::Asset))
            .sum()
    }

    /// Builds an account ledger from its rows in range.
    #[must_use]
    pub fn account_ledger(
        account: Account,
        range: Option<DateRange>,
        opening_balance: Decimal,
        rows: Vec<LedgerRow>,
    ) -> AccountLedgerReport {
        let closing_balance = opening_balance
            + rows
                .iter()
                .map(|r| account.signed_delta(r.debit, r.credit))
                .sum::<Decimal>();

        AccountLedgerReport {
            account,
            range,
            opening_balance,
            rows,
            closing_balance,
        }
    }
}

fn sorted(activity: &[AccountActivity]) -> Vec<&AccountActivity> {
    let mut sorted: Vec<&AccountActivity> = activity.iter().collect();
    sorted.sort_by(|a, b| a.account.code.cmp(&b.account.code));
    sorted
}

fn section(groups: Vec<(&str, ReportSection)>) -> BalanceSheetSection {
    let mut out = BalanceSheetSection::default();
    for (name, group) in groups {
        if group.lines.is_empty() {
            continue;
        }
        out.total += group.total;
        out.groups.push(BalanceSheetGroup {
            name: name.to_string(),
            section: group,
        });
    }
    out
}
