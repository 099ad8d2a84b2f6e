//! Report repository: loads per-account ledger activity and hands it to
//! [`ReportService`].
//!
//! Cumulative reports (trial balance, balance sheet) include closing
//! entries. Range reports (income statement, cash flow) leave them out so a
//! closed period still shows its revenue and expense.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QuerySelect, RelationTrait,
};
use tally_core::ledger::LedgerError;
use tally_core::reports::{
    AccountActivity, AccountBalanceReport, AccountLedgerReport, BalanceSheetReport, CashFlowReport,
    DateRange, IncomeStatementReport, ReportError, ReportService, TrialBalanceReport,
};
use tally_shared::types::{AccountId, CompanyId};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::account::AccountRepository;
use super::ledger::LedgerRepository;
use crate::convert::storage_error;
use crate::entities::{journal_entries, ledger_rows};

/// Debit and credit sums of one account.
#[derive(Debug, Clone, FromQueryResult)]
struct AccountTotals {
    account_id: Uuid,
    total_debit: Option<Decimal>,
    total_credit: Option<Decimal>,
}

/// Report repository for financial report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Trial balance as of a date.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the ledger cannot be read.
    #[instrument(skip(self))]
    pub async fn trial_balance(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
    ) -> Result<TrialBalanceReport, ReportError> {
        let activity = Self::activity_in(&self.db, company_id, None, as_of, false).await?;
        Ok(ReportService::trial_balance(as_of, &activity))
    }

    /// Balance sheet as of a date.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the ledger cannot be read.
    #[instrument(skip(self))]
    pub async fn balance_sheet(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
    ) -> Result<BalanceSheetReport, ReportError> {
        let activity = Self::activity_in(&self.db, company_id, None, as_of, false).await?;
        Ok(ReportService::balance_sheet(as_of, &activity))
    }

    /// Income statement over a range.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the ledger cannot be read.
    #[instrument(skip(self))]
    pub async fn income_statement(
        &self,
        company_id: CompanyId,
        range: DateRange,
    ) -> Result<IncomeStatementReport, ReportError> {
        let activity = Self::activity_in(&self.db, company_id, Some(range.start), range.end, true).await?;
        Ok(ReportService::income_statement(range, &activity))
    }

    /// Cash flow statement over a range (indirect method).
    ///
    /// Beginning cash is the cash balance the day before the range; ending
    /// cash is the cash balance at the range end.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the ledger cannot be read.
    #[instrument(skip(self))]
    pub async fn cash_flow(&self, company_id: CompanyId, range: DateRange) -> Result<CashFlowReport, ReportError> {
        let activity = Self::activity_in(&self.db, company_id, Some(range.start), range.end, true).await?;

        let beginning_cash = match range.day_before() {
            Some(day) => {
                let before = Self::activity_in(&self.db, company_id, None, day, false).await?;
                ReportService::cash_balance(&before)
            }
            None => Decimal::ZERO,
        };
        let through_end = Self::activity_in(&self.db, company_id, None, range.end, false).await?;
        let ending_cash = ReportService::cash_balance(&through_end);

        let report = ReportService::cash_flow(range, &activity, beginning_cash, ending_cash);
        if !report.summary.reconciles {
            debug!(
                calculated = %report.summary.calculated_ending_cash,
                ledger = %report.summary.ending_cash,
                "cash flow does not reconcile"
            );
        }
        Ok(report)
    }

    /// Rows of one account with opening and closing balances.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `Storage`.
    pub async fn account_ledger(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        range: Option<DateRange>,
    ) -> Result<AccountLedgerReport, ReportError> {
        let account = AccountRepository::resolve_in(&self.db, company_id, account_id).await?;
        let ledger = LedgerRepository::new(self.db.clone());

        let opening_balance = match range.and_then(|r| r.day_before()) {
            Some(day) => ledger.balance_as_of(company_id, account_id, day).await?,
            None => Decimal::ZERO,
        };
        let rows = ledger.rows_for_account(company_id, account_id, range).await?;

        Ok(ReportService::account_ledger(account, range, opening_balance, rows))
    }

    /// Signed balance of one account, optionally as of a date.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `Storage`.
    pub async fn account_balance(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        as_of: Option<NaiveDate>,
    ) -> Result<AccountBalanceReport, ReportError> {
        let ledger = LedgerRepository::new(self.db.clone());
        let balance = match as_of {
            Some(date) => ledger.balance_as_of(company_id, account_id, date).await?,
            None => ledger.balance(company_id, account_id).await?,
        };

        Ok(AccountBalanceReport {
            account_id,
            as_of,
            balance,
        })
    }

    /// Activity of every account of a company between `start` (inclusive,
    /// unbounded when `None`) and `end` (inclusive).
    ///
    /// Accounts without rows are returned with zero totals.
    pub(crate) async fn activity_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        start: Option<NaiveDate>,
        end: NaiveDate,
        exclude_closing: bool,
    ) -> Result<Vec<AccountActivity>, LedgerError> {
        let mut query = ledger_rows::Entity::find()
            .select_only()
            .column(ledger_rows::Column::AccountId)
            .column_as(
                Expr::col((ledger_rows::Entity, ledger_rows::Column::Debit)).sum(),
                "total_debit",
            )
            .column_as(
                Expr::col((ledger_rows::Entity, ledger_rows::Column::Credit)).sum(),
                "total_credit",
            )
            .filter(ledger_rows::Column::CompanyId.eq(company_id.into_inner()))
            .filter(ledger_rows::Column::EntryDate.lte(end));
        if let Some(start) = start {
            query = query.filter(ledger_rows::Column::EntryDate.gte(start));
        }
        if exclude_closing {
            query = query
                .join(JoinType::InnerJoin, ledger_rows::Relation::JournalEntries.def())
                .filter(journal_entries::Column::ClosingPeriodId.is_null());
        }

        let mut totals: HashMap<Uuid, AccountTotals> = query
            .group_by(ledger_rows::Column::AccountId)
            .into_model::<AccountTotals>()
            .all(conn)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(|t| (t.account_id, t))
            .collect();

        let accounts = AccountRepository::list_in(conn, company_id).await?;
        Ok(accounts
            .into_iter()
            .map(|account| {
                let sums = totals.remove(&account.id.into_inner());
                AccountActivity {
                    total_debit: sums.as_ref().and_then(|s| s.total_debit).unwrap_or_default(),
                    total_credit: sums.as_ref().and_then(|s| s.total_credit).unwrap_or_default(),
                    account,
                }
            })
            .collect())
    }
}
