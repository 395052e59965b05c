//! Seller profile queries.

use sqlx::PgPool;

use robo_shop_core::{SellerId, UserId};

use super::RepositoryError;
use crate::models::Seller;

#[derive(Debug, sqlx::FromRow)]
struct SellerRow {
    id: i32,
    user_id: i32,
    phone: String,
    address: String,
}

impl From<SellerRow> for Seller {
    fn from(row: SellerRow) -> Self {
        Self {
            id: SellerId::new(row.id),
            user_id: UserId::new(row.user_id),
            phone: row.phone,
            address: row.address,
        }
    }
}

/// Repository for seller profiles.
pub struct SellerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerRepository<'a> {
    /// Create a new seller repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the seller profile belonging to a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(
            "SELECT id, user_id, phone, address FROM shop.seller WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Seller::from))
    }

    /// Get a seller profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(
            "SELECT id, user_id, phone, address FROM shop.seller WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Seller::from))
    }
}
