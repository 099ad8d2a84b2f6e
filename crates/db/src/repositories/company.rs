//! Company repository.
//!
//! Companies only anchor the tenant partition; every ledger table is keyed
//! by `company_id`.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use tally_shared::types::CompanyId;

use crate::entities::companies;

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str) -> Result<companies::Model, DbErr> {
        companies::ActiveModel {
            id: Set(CompanyId::new().into_inner()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: CompanyId) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }
}
