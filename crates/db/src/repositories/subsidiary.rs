//! Customer and supplier running balances.
//!
//! Document modules adjust a party's balance inside the same transaction as
//! the journal entry they post, so the subsidiary ledger can never disagree
//! with the control account by a committed posting.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use tally_core::ledger::LedgerError;
use tally_core::string_enum;
use tally_shared::types::{CompanyId, PartyId};
use tracing::debug;

use crate::convert::storage_error;
use crate::entities::party_balances;

string_enum! {
    /// Kind of counterparty.
    pub enum PartyType {
        /// Receivable side.
        Customer => "customer",
        /// Payable side.
        Supplier => "supplier",
    }
}

/// Subsidiary balance repository.
#[derive(Debug, Clone)]
pub struct SubsidiaryRepository {
    db: DatabaseConnection,
}

impl SubsidiaryRepository {
    /// Creates a new subsidiary repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds `delta` to a party's balance within the caller's transaction and
    /// returns the new balance.
    ///
    /// The row is created on first use and locked before the update.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn adjust_in(
        txn: &DatabaseTransaction,
        company_id: CompanyId,
        party_type: PartyType,
        party_id: PartyId,
        delta: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let seed = party_balances::ActiveModel {
            company_id: Set(company_id.into_inner()),
            party_type: Set(party_type.as_str().to_string()),
            party_id: Set(party_id.into_inner()),
            current_balance: Set(Decimal::ZERO),
            updated_at: Set(Utc::now().into()),
        };
        match party_balances::Entity::insert(seed)
            .on_conflict(
                OnConflict::columns([
                    party_balances::Column::CompanyId,
                    party_balances::Column::PartyType,
                    party_balances::Column::PartyId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(storage_error(e)),
        }

        let current = Self::find(company_id, party_type, party_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(storage_error)?
            .map(|row| row.current_balance)
            .unwrap_or_default();
        let balance = current + delta;

        party_balances::Entity::update_many()
            .col_expr(party_balances::Column::CurrentBalance, Expr::value(balance))
            .col_expr(party_balances::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(party_balances::Column::CompanyId.eq(company_id.into_inner()))
            .filter(party_balances::Column::PartyType.eq(party_type.as_str()))
            .filter(party_balances::Column::PartyId.eq(party_id.into_inner()))
            .exec(txn)
            .await
            .map_err(storage_error)?;

        debug!(%party_type, %party_id, %delta, %balance, "party balance adjusted");
        Ok(balance)
    }

    /// Current balance of a party; zero if it never had an adjustment.
    ///
    /// # Errors
    ///
    /// Returns `PostingFailed` on storage errors.
    pub async fn balance(
        &self,
        company_id: CompanyId,
        party_type: PartyType,
        party_id: PartyId,
    ) -> Result<Decimal, LedgerError> {
        Ok(Self::find(company_id, party_type, party_id)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(|row| row.current_balance)
            .unwrap_or_default())
    }

    fn find(
        company_id: CompanyId,
        party_type: PartyType,
        party_id: PartyId,
    ) -> sea_orm::Select<party_balances::Entity> {
        party_balances::Entity::find()
            .filter(party_balances::Column::CompanyId.eq(company_id.into_inner()))
            .filter(party_balances::Column::PartyType.eq(party_type.as_str()))
            .filter(party_balances::Column::PartyId.eq(party_id.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_party_type_tags() {
        assert_eq!(PartyType::Customer.as_str(), "customer");
        assert_eq!(PartyType::Supplier.to_string(), "supplier");
        assert_eq!(PartyType::from_str("SUPPLIER").unwrap(), PartyType::Supplier);
        assert!(PartyType::from_str("vendor").is_err());
        assert_eq!(PartyType::ALL.len(), 2);
    }
}
