//! Accounting period repository.
//!
//! Implements period creation, date classification and the
//! close / reopen / lock / delete transitions. Closing posts a single
//! closing entry through the journal repository in the same transaction;
//! reopening voids it.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::events::LedgerEvent;
use tally_core::fiscal::{
    AccountingPeriod, ClosingService, NewPeriod, PeriodAction, PeriodClassification, PeriodStatus,
    classify,
};
use tally_core::ledger::{AccountSubtype, LedgerError, PostingReceipt, PostingRequest, VoidReceipt, VoidRequest};
use tally_shared::types::{AccountId, CompanyId, PeriodId, UserId};
use tracing::{info, instrument};

use super::account::AccountRepository;
use super::journal::{EntryLinks, JournalRepository};
use super::report::ReportRepository;
use crate::convert::{is_unique_violation, storage_error};
use crate::entities::accounting_periods;

/// Accounting period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
    journal: JournalRepository,
}

impl PeriodRepository {
    /// Creates a period repository posting through a default journal.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            journal: JournalRepository::new(db.clone()),
            db,
        }
    }

    /// Uses `journal` (and its policy and events) for closing entries.
    #[must_use]
    pub fn with_journal(mut self, journal: JournalRepository) -> Self {
        self.journal = journal;
        self
    }

    /// Creates an Open period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange`, `OverlappingPeriod` or `PostingFailed`.
    #[instrument(skip(self, input), fields(company_id = %input.company_id, name = %input.name))]
    pub async fn create(&self, input: NewPeriod) -> Result<AccountingPeriod, LedgerError> {
        let existing = self.list(input.company_id).await?;
        input.validate(&existing)?;

        let now = Utc::now().into();
        let model = accounting_periods::ActiveModel {
            id: Set(PeriodId::new().into_inner()),
            company_id: Set(input.company_id.into_inner()),
            name: Set(input.name.clone()),
            fiscal_year: Set(input.fiscal_year),
            period_type: Set(input.period_type.as_str().to_string()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            status: Set(PeriodStatus::Open.as_str().to_string()),
            closed_by: Set(None),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::OverlappingPeriod(input.name.clone())
            } else {
                storage_error(e)
            }
        })?;

        info!(period_id = %model.id, "accounting period created");
        AccountingPeriod::try_from(model)
    }

    /// Lists a company's periods by start date.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn list(&self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, LedgerError> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(accounting_periods::Column::StartDate)
            .order_by_asc(accounting_periods::Column::EndDate)
            .all(&self.db)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(AccountingPeriod::try_from)
            .collect()
    }

    /// Loads one period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PostingFailed`.
    pub async fn get(&self, company_id: CompanyId, period_id: PeriodId) -> Result<AccountingPeriod, LedgerError> {
        accounting_periods::Entity::find_by_id(period_id.into_inner())
            .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::PeriodNotFound(period_id))
            .and_then(AccountingPeriod::try_from)
    }

    /// Classifies a date against the company's periods.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn classify(&self, company_id: CompanyId, date: NaiveDate) -> Result<PeriodClassification, LedgerError> {
        Self::classify_in(&self.db, company_id, date, false).await
    }

    /// Classifies a date; with `lock`, the containing period rows are
    /// share-locked so a concurrent transition waits for the posting.
    pub(crate) async fn classify_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        date: NaiveDate,
        lock: bool,
    ) -> Result<PeriodClassification, LedgerError> {
        let mut query = accounting_periods::Entity::find()
            .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounting_periods::Column::StartDate.lte(date))
            .filter(accounting_periods::Column::EndDate.gte(date));
        if lock {
            query = query.lock_shared();
        }

        let periods = query
            .all(conn)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(AccountingPeriod::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(classify(&periods, date))
    }

    /// Applies a transition requested by action name.
    ///
    /// Returns the updated period, or `None` once deleted.
    ///
    /// # Errors
    ///
    /// See [`Self::close`], [`Self::reopen`], [`Self::lock`] and [`Self::delete`].
    pub async fn transition(
        &self,
        company_id: CompanyId,
        period_id: PeriodId,
        action: PeriodAction,
        user_id: UserId,
    ) -> Result<Option<AccountingPeriod>, LedgerError> {
        match action {
            PeriodAction::Close => self.close(company_id, period_id, user_id).await.map(Some),
            PeriodAction::Reopen => self.reopen(company_id, period_id, user_id).await.map(Some),
            PeriodAction::Lock => self.lock(company_id, period_id, user_id).await.map(Some),
            PeriodAction::Delete => self.delete(company_id, period_id).await.map(|()| None),
        }
    }

    /// Closes an Open period.
    ///
    /// Posts one closing entry dated on the period end that zeroes every
    /// Revenue and Expense balance into the retained earnings account, then
    /// marks the period Closed. No entry is posted when every balance is
    /// already zero.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidTransition`,
    /// `RetainedEarningsMissing`, any posting error, or `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn close(
        &self,
        company_id: CompanyId,
        period_id: PeriodId,
        user_id: UserId,
    ) -> Result<AccountingPeriod, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        let mut period = Self::lock_period_in(&txn, company_id, period_id).await?;
        let next = Self::next_status(&period, PeriodAction::Close)?;

        // Postings dated outside this period can still reach these accounts.
        let closing_accounts: Vec<AccountId> = AccountRepository::list_in(&txn, company_id)
            .await?
            .into_iter()
            .filter(|a| {
                a.account_type.is_income_statement() || a.subtype == Some(AccountSubtype::RetainedEarnings)
            })
            .map(|a| a.id)
            .collect();
        AccountRepository::lock_in(&txn, company_id, &closing_accounts).await?;

        let activity = ReportRepository::activity_in(&txn, company_id, None, period.end_date, false).await?;
        let balances: Vec<_> = activity
            .into_iter()
            .filter(|a| a.account.account_type.is_income_statement())
            .map(|a| {
                let balance = a.balance();
                (a.account, balance)
            })
            .collect();

        let retained =
            AccountRepository::find_by_subtype_in(&txn, company_id, AccountSubtype::RetainedEarnings).await?;
        let request = match retained {
            Some(retained) => ClosingService::closing_request(&period, user_id, &balances, &retained),
            None if balances.iter().all(|(_, b)| b.is_zero()) => None,
            None => return Err(LedgerError::RetainedEarningsMissing),
        };

        let mut closing: Option<(PostingRequest, PostingReceipt)> = None;
        if let Some(request) = request {
            let links = EntryLinks {
                closing_period_id: Some(period.id),
                ..EntryLinks::default()
            };
            let receipt = self.journal.post_entry_in(&txn, &request, links).await?;
            closing = Some((request, receipt));
        }

        Self::set_status_in(&txn, period.id, next, Some(user_id)).await?;
        txn.commit().await.map_err(storage_error)?;
        period.status = next;

        info!(
            period = %period.name,
            closing_entry = closing.as_ref().map(|(_, r)| r.entry_number.as_str()),
            "accounting period closed"
        );
        if let Some((request, receipt)) = &closing {
            self.journal.publish_posted(request, receipt);
        }
        self.publish_transition(&period, PeriodAction::Close, Some(next));
        Ok(period)
    }

    /// Reopens a Closed period, voiding its closing entries.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidTransition`, any void error, or
    /// `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn reopen(
        &self,
        company_id: CompanyId,
        period_id: PeriodId,
        user_id: UserId,
    ) -> Result<AccountingPeriod, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        // Entries before the period, the order a direct void takes them in.
        JournalRepository::closing_entries_in(&txn, company_id, period_id).await?;
        let mut period = Self::lock_period_in(&txn, company_id, period_id).await?;
        let next = Self::next_status(&period, PeriodAction::Reopen)?;

        // Reopen first so the reversals pass the period gate.
        Self::set_status_in(&txn, period.id, next, None).await?;

        let mut voided: Vec<VoidReceipt> = Vec::new();
        for entry_id in JournalRepository::closing_entries_in(&txn, company_id, period.id).await? {
            let mut request = VoidRequest::new(company_id, entry_id, user_id);
            request.reason = Some(format!("Reopen {}", period.name));
            voided.push(self.journal.void_in(&txn, &request).await?);
        }

        txn.commit().await.map_err(storage_error)?;
        period.status = next;

        info!(period = %period.name, voided = voided.len(), "accounting period reopened");
        for receipt in &voided {
            self.journal.publish_voided(company_id, receipt, None);
        }
        self.publish_transition(&period, PeriodAction::Reopen, Some(next));
        Ok(period)
    }

    /// Locks a Closed period. Terminal.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidTransition` or `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn lock(
        &self,
        company_id: CompanyId,
        period_id: PeriodId,
        user_id: UserId,
    ) -> Result<AccountingPeriod, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        let mut period = Self::lock_period_in(&txn, company_id, period_id).await?;
        let next = Self::next_status(&period, PeriodAction::Lock)?;

        Self::set_status_in(&txn, period.id, next, Some(user_id)).await?;
        txn.commit().await.map_err(storage_error)?;
        period.status = next;

        info!(period = %period.name, "accounting period locked");
        self.publish_transition(&period, PeriodAction::Lock, Some(next));
        Ok(period)
    }

    /// Deletes an Open period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidTransition` or `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: CompanyId, period_id: PeriodId) -> Result<(), LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        let period = Self::lock_period_in(&txn, company_id, period_id).await?;
        period.status.apply(PeriodAction::Delete)?;

        accounting_periods::Entity::delete_by_id(period.id.into_inner())
            .exec(&txn)
            .await
            .map_err(storage_error)?;
        txn.commit().await.map_err(storage_error)?;

        info!(period = %period.name, "accounting period deleted");
        self.publish_transition(&period, PeriodAction::Delete, None);
        Ok(())
    }

    fn next_status(period: &AccountingPeriod, action: PeriodAction) -> Result<PeriodStatus, LedgerError> {
        period
            .status
            .apply(action)?
            .ok_or_else(|| LedgerError::invalid_transition("accounting period", period.status, action))
    }

    fn publish_transition(&self, period: &AccountingPeriod, action: PeriodAction, status: Option<PeriodStatus>) {
        self.journal.events().publish(LedgerEvent::PeriodTransitioned {
            company_id: period.company_id,
            period_id: period.id,
            action,
            status,
        });
    }

    async fn lock_period_in(
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        period_id: PeriodId,
    ) -> Result<AccountingPeriod, LedgerError> {
        accounting_periods::Entity::find_by_id(period_id.into_inner())
            .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::PeriodNotFound(period_id))
            .and_then(AccountingPeriod::try_from)
    }

    async fn set_status_in(
        txn: &DatabaseTransaction,
        period_id: PeriodId,
        status: PeriodStatus,
        closed_by: Option<UserId>,
    ) -> Result<(), LedgerError> {
        let closing = status != PeriodStatus::Open;
        let closed_at = closing.then(Utc::now);
        let closed_by = if closing { closed_by.map(UserId::into_inner) } else { None };

        let mut update = accounting_periods::Entity::update_many()
            .col_expr(accounting_periods::Column::Status, Expr::value(status.as_str()))
            .col_expr(accounting_periods::Column::UpdatedAt, Expr::value(Utc::now()));
        if status != PeriodStatus::Locked {
            update = update
                .col_expr(accounting_periods::Column::ClosedAt, Expr::value(closed_at))
                .col_expr(accounting_periods::Column::ClosedBy, Expr::value(closed_by));
        }

        update
            .filter(accounting_periods::Column::Id.eq(period_id.into_inner()))
            .exec(txn)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
