//! Payment and order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use robo_shop_core::{OrderId, PaymentId, PaymentMethod, Price, ProductId, UserId};

/// A recorded checkout submission.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: PaymentId,
    /// `None` for anonymous checkouts or after the user was deleted.
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    /// Wilaya name.
    pub state: String,
    pub amount: Price,
    /// `None` when the buyer left the choice blank.
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Label of the chosen payment method, or a dash.
    #[must_use]
    pub fn method_label(&self) -> &'static str {
        self.payment_method.map_or("-", PaymentMethod::label)
    }
}

/// An order recorded for a logged-in buyer.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_price: Price,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// One product line of an order, priced at checkout time.
#[derive(Debug, Clone)]
pub struct OrderLine {
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl OrderLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}
