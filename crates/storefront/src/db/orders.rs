//! Orders and their line items.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use robo_shop_core::{CartLine, OrderId, PaymentMethod, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderLine};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    total_price: Decimal,
    payment_method: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: i32,
    product_id: Option<i32>,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let unit_price = Price::new(row.unit_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("order {} line price: {e}", row.order_id))
        })?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "order {} line quantity: {}",
                row.order_id, row.quantity
            ))
        })?;
        Ok(Self {
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            unit_price,
            quantity,
        })
    }
}

fn order_from_row(row: OrderRow, lines: Vec<OrderLine>) -> Result<Order, RepositoryError> {
    let total_price = Price::new(row.total_price)
        .map_err(|e| RepositoryError::DataCorruption(format!("order {} total: {e}", row.id)))?;
    let payment_method = row
        .payment_method
        .parse::<PaymentMethod>()
        .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

    Ok(Order {
        id: OrderId::new(row.id),
        user_id: UserId::new(row.user_id),
        total_price,
        payment_method,
        created_at: row.created_at,
        lines,
    })
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an order and its lines inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn create_with_lines(
        conn: &mut PgConnection,
        user_id: UserId,
        total_price: Price,
        payment_method: PaymentMethod,
        lines: &[CartLine],
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO shop.order (user_id, total_price, payment_method)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, total_price, payment_method, created_at
            ",
        )
        .bind(user_id)
        .bind(total_price)
        .bind(payment_method.code())
        .fetch_one(&mut *conn)
        .await?;

        let mut order_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity {} is too large", line.quantity))
            })?;
            sqlx::query(
                r"
                INSERT INTO shop.order_line (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(row.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;

            order_lines.push(OrderLine {
                product_id: Some(line.product_id),
                product_name: line.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
            });
        }

        order_from_row(row, order_lines)
    }

    /// A user's orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total_price, payment_method, created_at
            FROM shop.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT order_id, product_id, product_name, unit_price, quantity
            FROM shop.order_line
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines_by_order: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for line in line_rows {
            let order_id = line.order_id;
            lines_by_order
                .entry(order_id)
                .or_default()
                .push(OrderLine::try_from(line)?);
        }

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_order.remove(&row.id).unwrap_or_default();
                order_from_row(row, lines)
            })
            .collect()
    }
}
