//! Ledger repository: the append-only row projection and its queries.
//!
//! Each posted line becomes one row carrying the account's next
//! `account_version` and running balance. The latest row is read inside the
//! posting transaction after the account row lock is taken, so two postings
//! to the same account can never extend the same version.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tally_core::ledger::{
    Account, JournalLine, LedgerError, LedgerRow, LedgerService, RowPlan, RunningBalance,
};
use tally_core::reports::DateRange;
use tally_shared::types::{AccountId, CompanyId, JournalEntryId, LedgerRowId};
use tracing::debug;

use super::account::AccountRepository;
use crate::convert::storage_error;
use crate::entities::ledger_rows;

/// Debit and credit sums over a set of rows.
#[derive(Debug, Clone, Copy, Default, FromQueryResult)]
pub(crate) struct RowTotals {
    pub total_debit: Option<Decimal>,
    pub total_credit: Option<Decimal>,
}

impl RowTotals {
    pub(crate) fn debit(&self) -> Decimal {
        self.total_debit.unwrap_or_default()
    }

    pub(crate) fn credit(&self) -> Decimal {
        self.total_credit.unwrap_or_default()
    }
}

/// Ledger repository for row queries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Rows of one account, oldest first (entry date, then version).
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is not in the company, or
    /// `PostingFailed` on storage errors.
    pub async fn rows_for_account(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        range: Option<DateRange>,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        AccountRepository::resolve_in(&self.db, company_id, account_id).await?;

        let mut query = ledger_rows::Entity::find()
            .filter(ledger_rows::Column::CompanyId.eq(company_id.into_inner()))
            .filter(ledger_rows::Column::AccountId.eq(account_id.into_inner()));
        if let Some(range) = range {
            query = query
                .filter(ledger_rows::Column::EntryDate.gte(range.start))
                .filter(ledger_rows::Column::EntryDate.lte(range.end));
        }

        let rows = query
            .order_by_asc(ledger_rows::Column::EntryDate)
            .order_by_asc(ledger_rows::Column::AccountVersion)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(LedgerRow::from).collect())
    }

    /// Rows produced by one journal entry, in line order.
    ///
    /// Empty if the entry was never posted.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn rows_for_journal_entry(
        &self,
        company_id: CompanyId,
        journal_entry_id: JournalEntryId,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        let rows = ledger_rows::Entity::find()
            .filter(ledger_rows::Column::CompanyId.eq(company_id.into_inner()))
            .filter(ledger_rows::Column::JournalEntryId.eq(journal_entry_id.into_inner()))
            .order_by_asc(ledger_rows::Column::LineNumber)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(LedgerRow::from).collect())
    }

    /// Signed balance of an account over rows dated on or before `as_of`.
    ///
    /// Zero when no rows exist.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `PostingFailed`.
    pub async fn balance_as_of(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<Decimal, LedgerError> {
        let account = AccountRepository::resolve_in(&self.db, company_id, account_id).await?;
        let totals = Self::totals_in(&self.db, account_id, Some(as_of)).await?;
        Ok(account.signed_delta(totals.debit(), totals.credit()))
    }

    /// Signed balance of an account over all of its rows.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `PostingFailed`.
    pub async fn balance(&self, company_id: CompanyId, account_id: AccountId) -> Result<Decimal, LedgerError> {
        let account = AccountRepository::resolve_in(&self.db, company_id, account_id).await?;
        let totals = Self::totals_in(&self.db, account_id, None).await?;
        Ok(account.signed_delta(totals.debit(), totals.credit()))
    }

    /// Debit and credit sums of an account, optionally up to a date.
    pub(crate) async fn totals_in<C: ConnectionTrait>(
        conn: &C,
        account_id: AccountId,
        as_of: Option<NaiveDate>,
    ) -> Result<RowTotals, LedgerError> {
        let mut query = ledger_rows::Entity::find()
            .select_only()
            .column_as(Expr::col(ledger_rows::Column::Debit).sum(), "total_debit")
            .column_as(Expr::col(ledger_rows::Column::Credit).sum(), "total_credit")
            .filter(ledger_rows::Column::AccountId.eq(account_id.into_inner()));
        if let Some(as_of) = as_of {
            query = query.filter(ledger_rows::Column::EntryDate.lte(as_of));
        }

        Ok(query
            .into_model::<RowTotals>()
            .one(conn)
            .await
            .map_err(storage_error)?
            .unwrap_or_default())
    }

    /// The most recent row of an account (highest version), if any.
    pub(crate) async fn latest_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
    ) -> Result<Option<RunningBalance>, LedgerError> {
        let latest = ledger_rows::Entity::find()
            .filter(ledger_rows::Column::AccountId.eq(account_id.into_inner()))
            .order_by_desc(ledger_rows::Column::AccountVersion)
            .limit(1)
            .one(txn)
            .await
            .map_err(storage_error)?;

        Ok(latest.map(|row| RunningBalance {
            account_version: row.account_version,
            previous_balance: row.previous_balance,
            current_balance: row.running_balance,
        }))
    }

    /// Appends the rows of a posted entry and applies the balance deltas.
    ///
    /// `accounts` must be locked by the caller within `txn`.
    pub(crate) async fn append_rows_in(
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        journal_entry_id: JournalEntryId,
        entry_date: NaiveDate,
        lines: &[JournalLine],
        accounts: &HashMap<AccountId, Account>,
    ) -> Result<RowPlan, LedgerError> {
        let mut latest = HashMap::with_capacity(accounts.len());
        for account_id in accounts.keys() {
            if let Some(running) = Self::latest_in(txn, *account_id).await? {
                latest.insert(*account_id, running);
            }
        }

        let plan = LedgerService::plan_rows(lines, accounts, &latest)?;
        let now = Utc::now().into();

        let models: Vec<ledger_rows::ActiveModel> = plan
            .rows
            .iter()
            .map(|row| ledger_rows::ActiveModel {
                id: Set(LedgerRowId::new().into_inner()),
                company_id: Set(company_id.into_inner()),
                account_id: Set(row.account_id.into_inner()),
                journal_entry_id: Set(journal_entry_id.into_inner()),
                line_number: Set(row.line_number),
                account_version: Set(row.running.account_version),
                entry_date: Set(entry_date),
                debit: Set(row.debit),
                credit: Set(row.credit),
                previous_balance: Set(row.running.previous_balance),
                running_balance: Set(row.running.current_balance),
                description: Set(row.description.clone()),
                created_at: Set(now),
            })
            .collect();

        if !models.is_empty() {
            ledger_rows::Entity::insert_many(models)
                .exec_without_returning(txn)
                .await
                .map_err(storage_error)?;
        }

        for (account_id, delta) in &plan.deltas {
            AccountRepository::apply_delta_in(txn, *account_id, *delta).await?;
        }

        debug!(%journal_entry_id, rows = plan.rows.len(), "ledger rows appended");
        Ok(plan)
    }
}
