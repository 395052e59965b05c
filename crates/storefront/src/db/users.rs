//! User repository for database operations.
//!
//! Users, their password hashes, and (for sellers) the seller profile are
//! created together in one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use robo_shop_core::{Email, Role, SellerId, UserId, Username};

use super::RepositoryError;
use crate::models::User;

/// Phone number given to seller profiles created at signup.
pub const DEFAULT_SELLER_PHONE: &str = "000000000";

/// Address given to seller profiles created at signup.
pub const DEFAULT_SELLER_ADDRESS: &str = "Algiers";

const SELECT_USER: &str = r"
    SELECT u.id, u.username, u.email, s.id AS seller_id, u.created_at
    FROM shop.user u
    LEFT JOIN shop.seller s ON s.user_id = u.id
";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    seller_id: Option<i32>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            email,
            seller_id: row.seller_id.map(SellerId::new),
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.username = $1"))
            .bind(username.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by username.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT u.id, u.username, u.email, s.id AS seller_id, u.created_at,
                   p.password_hash
            FROM shop.user u
            JOIN shop.user_password p ON p.user_id = u.id
            LEFT JOIN shop.seller s ON s.user_id = u.id
            WHERE u.username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a user with a password, plus a seller profile when `role` is
    /// [`Role::Seller`].
    ///
    /// All rows are written in one transaction: a failure leaves no partial
    /// account behind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO shop.user (username, email)
            VALUES ($1, $2)
            RETURNING id, created_at
            ",
        )
        .bind(username.as_str())
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "username"))?;

        sqlx::query(
            r"
            INSERT INTO shop.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        let seller_id = match role {
            Role::Seller => {
                let (seller_id,): (i32,) = sqlx::query_as(
                    r"
                    INSERT INTO shop.seller (user_id, phone, address)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    ",
                )
                .bind(id)
                .bind(DEFAULT_SELLER_PHONE)
                .bind(DEFAULT_SELLER_ADDRESS)
                .fetch_one(&mut *tx)
                .await?;
                Some(SellerId::new(seller_id))
            }
            Role::Buyer => None,
        };

        tx.commit().await?;

        Ok(User {
            id: UserId::new(id),
            username: username.clone(),
            email: email.clone(),
            seller_id,
            created_at,
        })
    }
}
