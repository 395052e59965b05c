//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `shop`
//!
//! - `user` / `user_password` - Accounts and argon2 password hashes
//! - `seller` - Seller profile; its presence is what makes a user a seller
//! - `product` - Catalog, owned by sellers
//! - `payment` - Checkout submissions
//! - `order` / `order_line` - Orders recorded for logged-in buyers
//!
//! Sessions live in `tower_sessions.session`, managed by the session store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p robo-shop-cli -- migrate
//! ```
//!
//! Queries use `sqlx::query_as` with `FromRow` row types; rows are converted
//! into domain models, and values that fail domain validation surface as
//! [`RepositoryError::DataCorruption`].

pub mod checkout;
pub mod orders;
pub mod payments;
pub mod products;
pub mod sellers;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use checkout::{CheckoutRepository, CheckoutWrite, NewCheckout, Shortage};
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use sellers::SellerRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    const ACCOUNTS_MIGRATION: &str =
        include_str!("../../migrations/20260101000001_create_accounts.sql");

    /// Column definitions of a `CREATE TABLE` block in a migration.
    fn table_block<'a>(sql: &'a str, table: &str) -> &'a str {
        let start = sql.find(&format!("CREATE TABLE {table} (")).unwrap();
        let rest = &sql[start..];
        &rest[..rest.find(");").unwrap()]
    }

    #[test]
    fn test_user_table_tracks_timestamps() {
        let user = table_block(ACCOUNTS_MIGRATION, "shop.user");
        assert!(user.contains("created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
        assert!(user.contains("updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
    }
}
