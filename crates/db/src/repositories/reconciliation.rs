//! Balance reconciliation.
//!
//! Recomputes each account's balance from its ledger rows and overwrites the
//! cached `accounts.balance` where they disagree. The account row is locked
//! for the duration, so a concurrent posting either lands before the check
//! or waits for it.

use sea_orm::{DatabaseConnection, TransactionTrait};
use tally_core::events::{EventPublisher, LedgerEvent};
use tally_core::ledger::LedgerError;
use tally_core::reconciliation::{ReconciliationResult, ReconciliationService, ReconciliationSummary};
use tally_shared::types::{AccountId, CompanyId};
use tracing::{info, instrument, warn};

use super::account::AccountRepository;
use super::ledger::LedgerRepository;
use crate::convert::storage_error;

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    events: EventPublisher,
}

impl ReconciliationRepository {
    /// Creates a reconciliation repository without event publishing.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            events: EventPublisher::disabled(),
        }
    }

    /// Sets the post-commit event publisher.
    #[must_use]
    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    /// Reconciles one account, correcting its cached balance if it drifted.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn reconcile_account(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<ReconciliationResult, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        let account = AccountRepository::lock_in(&txn, company_id, &[account_id])
            .await?
            .remove(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let totals = LedgerRepository::totals_in(&txn, account_id, None).await?;
        let result = ReconciliationService::reconcile(&account, totals.debit(), totals.credit());

        if result.corrected {
            AccountRepository::overwrite_balance_in(&txn, account_id, result.ledger_balance).await?;
            warn!(
                %account_id,
                code = %account.code,
                stored = %result.stored_balance,
                ledger = %result.ledger_balance,
                drift = %result.drift(),
                "cached balance drifted; corrected from ledger"
            );
        }
        txn.commit().await.map_err(storage_error)?;

        if result.corrected {
            self.events.publish(LedgerEvent::BalanceCorrected {
                company_id,
                account_id,
                stored_balance: result.stored_balance,
                ledger_balance: result.ledger_balance,
            });
        }
        Ok(result)
    }

    /// Reconciles every account of a company, one transaction per account.
    ///
    /// # Errors
    ///
    /// Returns the first error; accounts already reconciled stay corrected.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self, company_id: CompanyId) -> Result<ReconciliationSummary, LedgerError> {
        let accounts = AccountRepository::list_in(&self.db, company_id).await?;

        let mut results = Vec::with_capacity(accounts.len());
        for account in accounts {
            results.push(self.reconcile_account(company_id, account.id).await?);
        }

        let summary = ReconciliationSummary::from_results(results);
        info!(
            total = summary.total_accounts,
            in_sync = summary.in_sync_count,
            corrected = summary.reconciled_count,
            "reconciliation finished"
        );
        Ok(summary)
    }
}
