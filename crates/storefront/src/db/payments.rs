//! Payment records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use robo_shop_core::{PaymentId, PaymentMethod, Price, UserId};

use super::RepositoryError;
use crate::models::Payment;

const PAYMENT_COLUMNS: &str =
    "id, user_id, first_name, last_name, phone, state, amount, payment_method, created_at";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    user_id: Option<i32>,
    first_name: String,
    last_name: String,
    phone: String,
    state: String,
    amount: Decimal,
    payment_method: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let amount = Price::new(row.amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid amount for payment {}: {e}", row.id))
        })?;
        let payment_method = PaymentMethod::parse_optional(&row.payment_method).map_err(|e| {
            RepositoryError::DataCorruption(format!("payment {}: {e}", row.id))
        })?;

        Ok(Self {
            id: PaymentId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            state: row.state,
            amount,
            payment_method,
            created_at: row.created_at,
        })
    }
}

/// Fields of a payment about to be recorded.
#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub user_id: Option<UserId>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub state: &'a str,
    pub amount: Price,
    pub payment_method: Option<PaymentMethod>,
}

/// Repository for payment records.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a payment inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        conn: &mut PgConnection,
        payment: &NewPayment<'_>,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            INSERT INTO shop.payment
                (user_id, first_name, last_name, phone, state, amount, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(payment.user_id)
        .bind(payment.first_name)
        .bind(payment.last_name)
        .bind(payment.phone)
        .bind(payment.state)
        .bind(payment.amount)
        .bind(payment.payment_method.map_or("", PaymentMethod::code))
        .fetch_one(&mut *conn)
        .await?;

        Payment::try_from(row)
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM shop.payment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    /// A user's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            SELECT {PAYMENT_COLUMNS}
            FROM shop.payment
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
