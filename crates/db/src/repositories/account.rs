//! Account repository for chart of accounts database operations.
//!
//! The cached `balance` column is only changed by [`AccountRepository::apply_delta_in`]
//! (posting) and by reconciliation.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tally_core::ledger::{Account, AccountSubtype, LedgerError, NewAccount};
use tally_shared::types::{AccountId, CompanyId};
use tracing::{info, instrument};

use crate::convert::{is_unique_violation, storage_error};
use crate::entities::accounts;

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// The normal balance defaults to the account type's natural side unless
    /// the input overrides it (contra accounts).
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` for a blank code or name,
    /// `DuplicateAccountCode` if the code exists in the company, or
    /// `PostingFailed` on storage errors.
    #[instrument(skip(self, input), fields(company_id = %input.company_id, code = %input.code))]
    pub async fn create(&self, input: NewAccount) -> Result<Account, LedgerError> {
        if input.code.trim().is_empty() {
            return Err(LedgerError::InvalidAccount("account code is required".to_string()));
        }
        if input.name.trim().is_empty() {
            return Err(LedgerError::InvalidAccount("account name is required".to_string()));
        }

        let code = input.code.clone();
        let account = input.into_account();
        let now = Utc::now().into();

        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            company_id: Set(account.company_id.into_inner()),
            code: Set(account.code.clone()),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.as_str().to_string()),
            normal_balance: Set(account.normal_balance.as_str().to_string()),
            subtype: Set(account.subtype.map(|s| s.as_str().to_string())),
            cash_flow_category: Set(account.cash_flow_category.map(|c| c.as_str().to_string())),
            balance: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::DuplicateAccountCode(code)
            } else {
                storage_error(e)
            }
        })?;

        info!(account_id = %inserted.id, "account created");
        Account::try_from(inserted)
    }

    /// Resolves an account within a company.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if absent or owned by another company.
    pub async fn resolve(&self, company_id: CompanyId, account_id: AccountId) -> Result<Account, LedgerError> {
        Self::resolve_in(&self.db, company_id, account_id).await
    }

    /// Resolves an account on any connection or transaction.
    pub(crate) async fn resolve_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .one(conn)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::AccountNotFound(account_id))
            .and_then(Account::try_from)
    }

    /// Lists every account of a company ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn list(&self, company_id: CompanyId) -> Result<Vec<Account>, LedgerError> {
        Self::list_in(&self.db, company_id).await
    }

    pub(crate) async fn list_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
    ) -> Result<Vec<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(conn)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// First active account of a company carrying `subtype`, by code.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn find_by_subtype(
        &self,
        company_id: CompanyId,
        subtype: AccountSubtype,
    ) -> Result<Option<Account>, LedgerError> {
        Self::find_by_subtype_in(&self.db, company_id, subtype).await
    }

    pub(crate) async fn find_by_subtype_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        subtype: AccountSubtype,
    ) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::Subtype.eq(subtype.as_str()))
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_asc(accounts::Column::Code)
            .one(conn)
            .await
            .map_err(storage_error)?
            .map(Account::try_from)
            .transpose()
    }

    /// Activates or deactivates an account.
    ///
    /// Inactive accounts keep their history but refuse new postings.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `PostingFailed`.
    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        is_active: bool,
    ) -> Result<Account, LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::IsActive, Expr::value(is_active))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        self.resolve(company_id, account_id).await
    }

    /// Locks the given accounts of a company and returns them by ID.
    ///
    /// Rows are locked one at a time in ascending ID order. Missing IDs are
    /// simply absent from the result.
    pub(crate) async fn lock_in(
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Account>, LedgerError> {
        let mut sorted = account_ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut locked = HashMap::with_capacity(sorted.len());
        for account_id in sorted {
            let model = accounts::Entity::find_by_id(account_id.into_inner())
                .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
                .lock_exclusive()
                .one(txn)
                .await
                .map_err(storage_error)?;
            if let Some(model) = model {
                locked.insert(account_id, Account::try_from(model)?);
            }
        }
        Ok(locked)
    }

    /// Loads the given accounts of a company without locking them.
    pub(crate) async fn load_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Account>, LedgerError> {
        let ids: Vec<_> = account_ids.iter().map(|id| id.into_inner()).collect();
        accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::Id.is_in(ids))
            .all(conn)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(|model| Account::try_from(model).map(|account| (account.id, account)))
            .collect()
    }

    /// Adds a signed delta to an account's cached balance.
    ///
    /// Only usable inside an open transaction; the caller must already hold
    /// the account row lock.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors or if the account vanished.
    pub async fn apply_delta_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<(), LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .exec(txn)
            .await
            .map_err(storage_error)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::PostingFailed(format!(
                "account {account_id} disappeared while applying a balance delta"
            )));
        }
        Ok(())
    }

    /// Overwrites an account's cached balance. Used by reconciliation.
    pub(crate) async fn overwrite_balance_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .exec(txn)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
