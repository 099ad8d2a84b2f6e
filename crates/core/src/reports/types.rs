//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::error::ReportError;
use crate::ledger::{Account, AccountSubtype, AccountType, LedgerRow};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The day before the range starts.
    #[must_use]
    pub fn day_before(&self) -> Option<NaiveDate> {
        self.start.pred_opt()
    }
}

/// Debit and credit totals of one account over some window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountActivity {
    /// The account.
    pub account: Account,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

impl AccountActivity {
    /// Signed balance on the account's own normal side.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.account.signed_delta(self.total_debit, self.total_credit)
    }

    /// Signed balance on the natural side of an account type.
    ///
    /// Contra accounts come out negative, reducing their section.
    #[must_use]
    pub fn balance_as(&self, account_type: AccountType) -> Decimal {
        account_type
            .default_normal_balance()
            .signed_delta(self.total_debit, self.total_credit)
    }

    /// Returns true if no debit or credit was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_debit.is_zero() && self.total_credit.is_zero()
    }
}

/// One account line in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Account ID; `None` for computed lines.
    pub account_id: Option<AccountId>,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account sub-type.
    pub subtype: Option<AccountSubtype>,
    /// Amount.
    pub amount: Decimal,
}

impl ReportLine {
    /// A line for a real account.
    #[must_use]
    pub fn for_account(account: &Account, amount: Decimal) -> Self {
        Self {
            account_id: Some(account.id),
            code: account.code.clone(),
            name: account.name.clone(),
            subtype: account.subtype,
            amount,
        }
    }

    /// A computed line with no backing account.
    #[must_use]
    pub fn computed(name: &str, amount: Decimal) -> Self {
        Self {
            account_id: None,
            code: String::new(),
            name: name.to_string(),
            subtype: None,
            amount,
        }
    }
}

/// A list of lines with their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Decimal,
    /// Lines in this section.
    pub lines: Vec<ReportLine>,
}

impl ReportSection {
    /// Adds a line and its amount to the total.
    pub fn push(&mut self, line: ReportLine) {
        self.total += line.amount;
        self.lines.push(line);
    }
}

/// Trial balance row, presented on the natural side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// Accounts with activity, ordered by code.
    pub lines: Vec<TrialBalanceLine>,
    /// Debit column total.
    pub total_debit: Decimal,
    /// Credit column total.
    pub total_credit: Decimal,
    /// Whether the columns agree.
    pub balanced: bool,
}

/// Named group within a balance sheet section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetGroup {
    /// Group name, e.g. "Current assets".
    pub name: String,
    /// Lines and total.
    pub section: ReportSection,
}

/// Balance sheet section (assets, liabilities, equity).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetSection {
    /// Section total.
    pub total: Decimal,
    /// Groups in display order; empty groups are omitted.
    pub groups: Vec<BalanceSheetGroup>,
}

/// Assets = Liabilities + Equity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEquation {
    /// Total assets.
    pub assets: Decimal,
    /// Total liabilities.
    pub liabilities: Decimal,
    /// Total equity.
    pub equity: Decimal,
    /// assets - (liabilities + equity).
    pub difference: Decimal,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// Assets section.
    pub assets: BalanceSheetSection,
    /// Liabilities section.
    pub liabilities: BalanceSheetSection,
    /// Equity section.
    pub equity: BalanceSheetSection,
    /// Equation check.
    pub equation: AccountingEquation,
    /// Whether the difference is below tolerance.
    pub balanced: bool,
}

/// Revenue groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSection {
    /// Operating revenue.
    pub operating: ReportSection,
    /// Other income.
    pub other: ReportSection,
    /// All revenue.
    pub total: Decimal,
}

/// Expense groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSection {
    /// Cost of goods sold.
    pub cost_of_goods_sold: ReportSection,
    /// Operating expenses.
    pub operating: ReportSection,
    /// Other expenses.
    pub other: ReportSection,
    /// All expenses.
    pub total: Decimal,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Reporting range.
    pub range: DateRange,
    /// Revenue.
    pub revenue: RevenueSection,
    /// Expenses.
    pub expenses: ExpenseSection,
    /// Operating revenue - cost of goods sold.
    pub gross_profit: Decimal,
    /// Gross profit - operating expenses.
    pub operating_income: Decimal,
    /// revenue.total - expenses.total.
    pub net_income: Decimal,
}

/// Operating activities, indirect method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingActivities {
    /// Starting point.
    pub net_income: Decimal,
    /// Working-capital and other non-cash adjustments.
    pub adjustments: ReportSection,
    /// net_income + adjustments.
    pub total: Decimal,
}

/// Cash flow summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    /// Cash balance the day before the range.
    pub beginning_cash: Decimal,
    /// operating + investing + financing.
    pub net_cash_flow: Decimal,
    /// beginning_cash + net_cash_flow.
    pub calculated_ending_cash: Decimal,
    /// Cash balance from the ledger at the range end.
    pub ending_cash: Decimal,
    /// Whether calculated and ledger ending cash agree.
    pub reconciles: bool,
}

/// Cash flow statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowReport {
    /// Reporting range.
    pub range: DateRange,
    /// Operating activities.
    pub operating: OperatingActivities,
    /// Investing activities.
    pub investing: ReportSection,
    /// Financing activities.
    pub financing: ReportSection,
    /// Summary.
    pub summary: CashFlowSummary,
}

/// One account's rows with opening and closing balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedgerReport {
    /// The account.
    pub account: Account,
    /// Optional range.
    pub range: Option<DateRange>,
    /// Balance before the first row in range.
    pub opening_balance: Decimal,
    /// Rows, oldest first.
    pub rows: Vec<LedgerRow>,
    /// Balance after the last row in range.
    pub closing_balance: Decimal,
}

/// Account balance as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceReport {
    /// Account ID.
    pub account_id: AccountId,
    /// As of date; `None` means all rows.
    pub as_of: Option<NaiveDate>,
    /// Signed balance.
    pub balance: Decimal,
}
