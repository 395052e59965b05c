//! The checkout transaction.
//!
//! Stock is re-checked against locked product rows, decremented, and the
//! payment (plus the order, for logged-in buyers) recorded, all or nothing.

use std::collections::HashMap;

use sqlx::PgPool;

use robo_shop_core::{Cart, CartLine, PaymentMethod, Price, ProductId, UserId, cart_total};

use super::RepositoryError;
use super::orders::OrderRepository;
use super::payments::{NewPayment, PaymentRepository};
use super::products::ProductRepository;
use crate::models::{Order, Payment};

/// Everything needed to place an order from a cart.
#[derive(Debug, Clone)]
pub struct NewCheckout<'a> {
    /// `None` for anonymous checkouts; no order is recorded then.
    pub user_id: Option<UserId>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub state: &'a str,
    pub payment_method: Option<PaymentMethod>,
    pub cart: &'a Cart,
}

/// A cart line that no longer fits in the available stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortage {
    pub product_id: ProductId,
    /// Units left; zero when the product was deleted.
    pub available: u32,
}

/// What the checkout transaction did.
#[derive(Debug)]
pub enum CheckoutWrite {
    /// Stock was decremented and the payment recorded.
    Placed {
        payment: Payment,
        order: Option<Order>,
        lines: Vec<CartLine>,
    },
    /// Nothing was written: some lines exceed current stock.
    Short(Vec<Shortage>),
    /// Nothing was written: the total does not fit the amount column.
    AmountTooLarge,
}

/// Repository that runs the checkout transaction.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for the cart.
    ///
    /// Product rows are locked with `FOR UPDATE` for the duration of the
    /// transaction, so two concurrent checkouts cannot both take the last unit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails, and
    /// `RepositoryError::DataCorruption` for invalid stored prices.
    pub async fn place(&self, checkout: &NewCheckout<'_>) -> Result<CheckoutWrite, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let rows =
            ProductRepository::lock_for_update(&mut tx, &checkout.cart.product_ids()).await?;
        let by_id: HashMap<i32, _> = rows.into_iter().map(|row| (row.id, row)).collect();

        let mut shortages = Vec::new();
        let mut lines = Vec::with_capacity(checkout.cart.len());
        for (product_id, quantity) in checkout.cart.iter() {
            let Some(row) = by_id.get(&product_id.as_i32()) else {
                shortages.push(Shortage {
                    product_id,
                    available: 0,
                });
                continue;
            };
            let available = u32::try_from(row.stock).unwrap_or(0);
            if available < quantity {
                shortages.push(Shortage {
                    product_id,
                    available,
                });
                continue;
            }
            let unit_price = Price::new(row.price).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price for product {product_id}: {e}"))
            })?;
            lines.push(CartLine {
                product_id,
                name: row.name.clone(),
                unit_price,
                quantity,
            });
        }

        if !shortages.is_empty() {
            tx.rollback().await?;
            return Ok(CheckoutWrite::Short(shortages));
        }

        let Ok(amount) = Price::new(cart_total(&lines)) else {
            tx.rollback().await?;
            return Ok(CheckoutWrite::AmountTooLarge);
        };

        for line in &lines {
            ProductRepository::decrement_stock(&mut tx, line.product_id, line.quantity).await?;
        }

        let payment = PaymentRepository::create(
            &mut tx,
            &NewPayment {
                user_id: checkout.user_id,
                first_name: checkout.first_name,
                last_name: checkout.last_name,
                phone: checkout.phone,
                state: checkout.state,
                amount,
                payment_method: checkout.payment_method,
            },
        )
        .await?;

        let order = match checkout.user_id {
            Some(user_id) => Some(
                OrderRepository::create_with_lines(
                    &mut tx,
                    user_id,
                    amount,
                    checkout
                        .payment_method
                        .unwrap_or(PaymentMethod::CashOnDelivery),
                    &lines,
                )
                .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        Ok(CheckoutWrite::Placed {
            payment,
            order,
            lines,
        })
    }
}
