//! Journal repository: the posting engine.
//!
//! Every public operation is one database transaction. Validation runs
//! before the first write; once writing starts any storage failure rolls
//! the whole operation back and surfaces as `PostingFailed`.
//!
//! Lock and write order inside a posting:
//! 1. share-lock the periods containing the entry date
//! 2. lock the touched accounts (ascending ID), then validate the request
//! 3. lock the company/year sequence row and allocate the entry number
//! 4. insert the entry and its lines
//! 5. append ledger rows and apply cached balance deltas (Posted only)

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::events::{EventPublisher, LedgerEvent};
use tally_core::fiscal::PeriodGuard;
use tally_core::ledger::{
    Account, EntryNumber, EntryStatus, JournalEntry, JournalLine, LedgerError, LedgerService,
    PostingPolicy, PostingReceipt, PostingRequest, PostingWarning, SourceDocument, ValidatedEntry,
    VoidReceipt, VoidRequest,
};
use tally_core::workflow::{ReversalService, WorkflowService};
use tally_shared::types::{AccountId, CompanyId, JournalEntryId, PeriodId, UserId};
use tracing::{info, instrument, warn};

use super::account::AccountRepository;
use super::ledger::LedgerRepository;
use super::period::PeriodRepository;
use crate::convert::{self, storage_error};
use crate::entities::{journal_entries, journal_lines, journal_sequences};

/// Links stored on an entry created by the engine itself.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EntryLinks {
    /// The entry this one reverses.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// The period whose closing produced this entry.
    pub closing_period_id: Option<PeriodId>,
}

/// Journal repository for posting, draft promotion and voiding.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    policy: PostingPolicy,
    events: EventPublisher,
}

impl JournalRepository {
    /// Creates a repository with the default policy and no event publishing.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            policy: PostingPolicy::default(),
            events: EventPublisher::disabled(),
        }
    }

    /// Sets the posting policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PostingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the post-commit event publisher.
    #[must_use]
    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    /// The posting policy in force.
    #[must_use]
    pub const fn policy(&self) -> &PostingPolicy {
        &self.policy
    }

    /// The post-commit event publisher.
    #[must_use]
    pub const fn events(&self) -> &EventPublisher {
        &self.events
    }

    /// Posts a journal entry in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error (`InsufficientLines`, `InvalidLineAmount`,
    /// `UnbalancedEntry`, `UnknownAccount`, `InactiveAccount`,
    /// `ClosedPeriod`, `LockedPeriod`) before anything is written, or
    /// `PostingFailed` if the write phase fails.
    #[instrument(
        skip(self, request),
        fields(company_id = %request.company_id, entry_date = %request.entry_date, lines = request.lines.len())
    )]
    pub async fn post(&self, request: PostingRequest) -> Result<PostingReceipt, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        let receipt = self.post_in(&txn, &request).await?;
        txn.commit().await.map_err(storage_error)?;

        info!(
            entry_id = %receipt.entry_id,
            entry_number = %receipt.entry_number,
            status = %receipt.status,
            "journal entry committed"
        );
        self.publish_posted(&request, &receipt);
        Ok(receipt)
    }

    /// Posts a journal entry inside a caller-owned transaction.
    ///
    /// Nothing is published; call [`Self::publish_posted`] after committing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::post`]. On error the caller must roll back.
    pub async fn post_in(
        &self,
        txn: &DatabaseTransaction,
        request: &PostingRequest,
    ) -> Result<PostingReceipt, LedgerError> {
        self.post_entry_in(txn, request, EntryLinks::default()).await
    }

    /// Publishes the event for a committed posting.
    pub fn publish_posted(&self, request: &PostingRequest, receipt: &PostingReceipt) {
        self.events.publish(LedgerEvent::EntryPosted {
            company_id: request.company_id,
            entry_id: receipt.entry_id,
            entry_number: receipt.entry_number.clone(),
            status: receipt.status,
            source_document: request.source_document,
            warnings: receipt.warnings.clone(),
        });
    }

    /// Promotes a Draft entry to Posted and appends its ledger rows.
    ///
    /// Accounts and the period gate are checked again at promotion time.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `InvalidTransition` if the entry is not a
    /// draft, the account and period errors of [`Self::post`], or
    /// `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn post_draft(
        &self,
        company_id: CompanyId,
        journal_entry_id: JournalEntryId,
        user_id: UserId,
    ) -> Result<PostingReceipt, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;

        let model = Self::lock_entry_in(&txn, company_id, journal_entry_id).await?;
        let source_document = convert::source_document(&model)?;
        let status: EntryStatus = model
            .status
            .parse()
            .map_err(|e| LedgerError::PostingFailed(format!("{e}")))?;
        let action = WorkflowService::post_draft(status, user_id)?;

        let lines = Self::lines_in(&txn, journal_entry_id).await?;
        let warning = self.check_period_in(&txn, company_id, model.entry_date).await?;

        let account_ids: Vec<AccountId> = lines.iter().map(|l| l.account_id).collect();
        let accounts = AccountRepository::lock_in(&txn, company_id, &account_ids).await?;
        LedgerService::validate_accounts(company_id, &lines, &accounts)?;

        LedgerRepository::append_rows_in(
            &txn,
            company_id,
            journal_entry_id,
            model.entry_date,
            &lines,
            &accounts,
        )
        .await?;

        let posted_at = action.at();
        journal_entries::Entity::update_many()
            .col_expr(journal_entries::Column::Status, Expr::value(action.new_status().as_str()))
            .col_expr(journal_entries::Column::PostedAt, Expr::value(posted_at))
            .col_expr(journal_entries::Column::PostedBy, Expr::value(user_id.into_inner()))
            .col_expr(journal_entries::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(journal_entries::Column::Id.eq(journal_entry_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(storage_error)?;

        txn.commit().await.map_err(storage_error)?;

        let receipt = PostingReceipt {
            entry_id: journal_entry_id,
            entry_number: model.entry_number,
            status: EntryStatus::Posted,
            warnings: warning.into_iter().collect(),
        };
        info!(entry_number = %receipt.entry_number, "draft journal entry posted");
        self.events.publish(LedgerEvent::EntryPosted {
            company_id,
            entry_id: receipt.entry_id,
            entry_number: receipt.entry_number.clone(),
            status: receipt.status,
            source_document,
            warnings: receipt.warnings.clone(),
        });
        Ok(receipt)
    }

    /// Voids a Posted entry by posting its mirrored reversal.
    ///
    /// The original's rows stay untouched; the reversal's rows bring every
    /// affected account back to its pre-entry balance.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `InvalidTransition` if the entry is not
    /// Posted, the period errors of [`Self::post`] for the original date, or
    /// `PostingFailed`.
    #[instrument(skip(self, request), fields(company_id = %request.company_id, entry_id = %request.journal_entry_id))]
    pub async fn void(&self, request: VoidRequest) -> Result<VoidReceipt, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        let (receipt, source_document) = self.void_entry_in(&txn, &request).await?;
        txn.commit().await.map_err(storage_error)?;

        info!(
            reversal_entry_number = %receipt.reversal_entry_number,
            "journal entry voided"
        );
        self.publish_voided(request.company_id, &receipt, source_document);
        Ok(receipt)
    }

    /// Voids a Posted entry inside a caller-owned transaction.
    ///
    /// Document modules use this to reverse their subsidiary balances in the
    /// same transaction. Nothing is published; call
    /// [`Self::publish_voided`] after committing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::void`]. On error the caller must roll back.
    pub async fn void_in(
        &self,
        txn: &DatabaseTransaction,
        request: &VoidRequest,
    ) -> Result<VoidReceipt, LedgerError> {
        self.void_entry_in(txn, request).await.map(|(receipt, _)| receipt)
    }

    /// Publishes the event for a committed void.
    pub fn publish_voided(
        &self,
        company_id: CompanyId,
        receipt: &VoidReceipt,
        source_document: Option<SourceDocument>,
    ) {
        self.events.publish(LedgerEvent::EntryVoided {
            company_id,
            entry_id: receipt.voided_entry_id,
            reversal_entry_id: receipt.reversal_entry_id,
            source_document,
        });
    }

    /// Loads an entry with its ordered lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` or `PostingFailed`.
    pub async fn get_entry(
        &self,
        company_id: CompanyId,
        journal_entry_id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        let model = journal_entries::Entity::find_by_id(journal_entry_id.into_inner())
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::EntryNotFound(journal_entry_id))?;

        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(journal_entry_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        convert::journal_entry(model, lines)
    }

    pub(crate) async fn post_entry_in(
        &self,
        txn: &DatabaseTransaction,
        request: &PostingRequest,
        links: EntryLinks,
    ) -> Result<PostingReceipt, LedgerError> {
        let company_id = request.company_id;
        let warning = self.check_period_in(txn, company_id, request.entry_date).await?;

        let status = request.disposition.initial_status();
        let account_ids = LedgerService::account_ids(&request.lines);
        let accounts: HashMap<AccountId, Account> = if status == EntryStatus::Posted {
            AccountRepository::lock_in(txn, company_id, &account_ids).await?
        } else {
            AccountRepository::load_in(txn, company_id, &account_ids).await?
        };
        let ValidatedEntry { lines, .. } = LedgerService::validate(request, &accounts)?;

        let entry_number = self
            .allocate_entry_number_in(txn, company_id, request.entry_date)
            .await?;
        let entry_id = JournalEntryId::new();
        let now = Utc::now().into();
        let posted = status == EntryStatus::Posted;

        journal_entries::ActiveModel {
            id: Set(entry_id.into_inner()),
            company_id: Set(company_id.into_inner()),
            entry_number: Set(entry_number.clone()),
            entry_date: Set(request.entry_date),
            reference_number: Set(request.reference_number.clone()),
            description: Set(request.description.clone()),
            status: Set(status.as_str().to_string()),
            source_document_type: Set(request.source_document.map(|d| d.doc_type.as_str().to_string())),
            source_document_id: Set(request.source_document.map(|d| d.id.into_inner())),
            reverses_entry_id: Set(links.reverses_entry_id.map(JournalEntryId::into_inner)),
            reversed_by_entry_id: Set(None),
            closing_period_id: Set(links.closing_period_id.map(PeriodId::into_inner)),
            created_by: Set(request.user_id.into_inner()),
            posted_by: Set(posted.then(|| request.user_id.into_inner())),
            voided_by: Set(None),
            void_reason: Set(None),
            created_at: Set(now),
            posted_at: Set(posted.then_some(now)),
            voided_at: Set(None),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(storage_error)?;

        let line_models: Vec<journal_lines::ActiveModel> = lines
            .iter()
            .map(|line| journal_lines::ActiveModel {
                id: Set(uuid::Uuid::now_v7()),
                journal_entry_id: Set(entry_id.into_inner()),
                line_number: Set(line.line_number),
                account_id: Set(line.account_id.into_inner()),
                debit: Set(line.debit),
                credit: Set(line.credit),
                description: Set(line.description.clone()),
            })
            .collect();
        journal_lines::Entity::insert_many(line_models)
            .exec_without_returning(txn)
            .await
            .map_err(storage_error)?;

        if posted {
            LedgerRepository::append_rows_in(
                txn,
                company_id,
                entry_id,
                request.entry_date,
                &lines,
                &accounts,
            )
            .await?;
        }

        Ok(PostingReceipt {
            entry_id,
            entry_number,
            status,
            warnings: warning.into_iter().collect(),
        })
    }

    async fn void_entry_in(
        &self,
        txn: &DatabaseTransaction,
        request: &VoidRequest,
    ) -> Result<(VoidReceipt, Option<SourceDocument>), LedgerError> {
        let model = Self::lock_entry_in(txn, request.company_id, request.journal_entry_id).await?;
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(model.id))
            .all(txn)
            .await
            .map_err(storage_error)?;
        let original = convert::journal_entry(model, lines)?;

        let action = WorkflowService::void(original.status, request.user_id, request.reason.clone())?;
        if !ReversalService::validate_reversal(&original.lines) {
            return Err(LedgerError::PostingFailed(format!(
                "stored entry {} is not balanced",
                original.entry_number
            )));
        }

        let reversal = ReversalService::reversal_request(&original, request.user_id, request.reason.as_deref());
        let links = EntryLinks {
            reverses_entry_id: Some(original.id),
            closing_period_id: original.closing_period_id,
        };
        let receipt = self.post_entry_in(txn, &reversal, links).await?;

        journal_entries::Entity::update_many()
            .col_expr(journal_entries::Column::Status, Expr::value(action.new_status().as_str()))
            .col_expr(journal_entries::Column::VoidedAt, Expr::value(action.at()))
            .col_expr(journal_entries::Column::VoidedBy, Expr::value(request.user_id.into_inner()))
            .col_expr(journal_entries::Column::VoidReason, Expr::value(request.reason.clone()))
            .col_expr(
                journal_entries::Column::ReversedByEntryId,
                Expr::value(receipt.entry_id.into_inner()),
            )
            .col_expr(journal_entries::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(journal_entries::Column::Id.eq(original.id.into_inner()))
            .exec(txn)
            .await
            .map_err(storage_error)?;

        Ok((
            VoidReceipt {
                voided_entry_id: original.id,
                reversal_entry_id: receipt.entry_id,
                reversal_entry_number: receipt.entry_number,
                warnings: receipt.warnings,
            },
            original.source_document,
        ))
    }

    /// Posted, non-reversal entries produced by closing `period_id`, locked
    /// for update.
    pub(crate) async fn closing_entries_in(
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        period_id: PeriodId,
    ) -> Result<Vec<JournalEntryId>, LedgerError> {
        let entries = journal_entries::Entity::find()
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(journal_entries::Column::ClosingPeriodId.eq(period_id.into_inner()))
            .filter(journal_entries::Column::ReversesEntryId.is_null())
            .filter(journal_entries::Column::Status.eq(EntryStatus::Posted.as_str()))
            .order_by_asc(journal_entries::Column::CreatedAt)
            .lock_exclusive()
            .all(txn)
            .await
            .map_err(storage_error)?;

        Ok(entries
            .into_iter()
            .map(|e| JournalEntryId::from_uuid(e.id))
            .collect())
    }

    async fn check_period_in(
        &self,
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> Result<Option<PostingWarning>, LedgerError> {
        let classification = PeriodRepository::classify_in(txn, company_id, date, true).await?;
        let warning = PeriodGuard::check(classification, date, self.policy.closed_period)?;
        if warning.is_some() {
            warn!(%company_id, %date, "posting into a closed period");
        }
        Ok(warning)
    }

    /// Allocates `<PREFIX>-<YEAR>-<NNNN>` while holding the sequence row lock.
    async fn allocate_entry_number_in(
        &self,
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        entry_date: NaiveDate,
    ) -> Result<String, LedgerError> {
        let year = entry_date.year();
        let now = Utc::now().into();

        let inserted = journal_sequences::Entity::insert(journal_sequences::ActiveModel {
            company_id: Set(company_id.into_inner()),
            year: Set(year),
            last_value: Set(0),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([journal_sequences::Column::CompanyId, journal_sequences::Column::Year])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await;
        match inserted {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(storage_error(e)),
        }

        let sequence = journal_sequences::Entity::find_by_id((company_id.into_inner(), year))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| LedgerError::PostingFailed(format!("entry sequence for {year} is missing")))?;

        let (first_day, last_day) = NaiveDate::from_ymd_opt(year, 1, 1)
            .zip(NaiveDate::from_ymd_opt(year, 12, 31))
            .ok_or_else(|| LedgerError::PostingFailed(format!("year {year} is out of range")))?;
        let existing = journal_entries::Entity::find()
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(journal_entries::Column::EntryDate.between(first_day, last_day))
            .count(txn)
            .await
            .map_err(storage_error)?;

        let number = EntryNumber::next(&self.policy.entry_number_prefix, year, existing);
        let last_value = i64::try_from(number.sequence)
            .map_err(|_| LedgerError::PostingFailed("entry sequence overflow".to_string()))?;

        let mut active: journal_sequences::ActiveModel = sequence.into();
        active.last_value = Set(last_value);
        active.updated_at = Set(now);
        active.update(txn).await.map_err(storage_error)?;

        Ok(number.to_string())
    }

    async fn lock_entry_in(
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        journal_entry_id: JournalEntryId,
    ) -> Result<journal_entries::Model, LedgerError> {
        journal_entries::Entity::find_by_id(journal_entry_id.into_inner())
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::EntryNotFound(journal_entry_id))
    }

    async fn lines_in(
        txn: &DatabaseTransaction,
        journal_entry_id: JournalEntryId,
    ) -> Result<Vec<JournalLine>, LedgerError> {
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(journal_entry_id.into_inner()))
            .order_by_asc(journal_lines::Column::LineNumber)
            .all(txn)
            .await
            .map_err(storage_error)?;
        Ok(lines.into_iter().map(JournalLine::from).collect())
    }
}
