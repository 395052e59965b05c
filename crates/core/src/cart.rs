//! The shopping cart held in a buyer's session.
//!
//! A cart maps product ids to quantities. Quantities are clamped against the
//! product's stock when items are added: the cart never grows a line past the
//! stock that was available at the time of the add.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A quantity requested on the add-to-cart form, normalized to at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedQuantity(u32);

impl RequestedQuantity {
    /// Normalize the raw `quantity` form field.
    ///
    /// Missing or unparsable input means 1; anything below 1 is raised to 1.
    ///
    /// ```
    /// use robo_shop_core::RequestedQuantity;
    ///
    /// assert_eq!(RequestedQuantity::from_form(None).get(), 1);
    /// assert_eq!(RequestedQuantity::from_form(Some("abc")).get(), 1);
    /// assert_eq!(RequestedQuantity::from_form(Some("-4")).get(), 1);
    /// assert_eq!(RequestedQuantity::from_form(Some(" 3 ")).get(), 3);
    /// ```
    #[must_use]
    pub fn from_form(raw: Option<&str>) -> Self {
        let parsed = raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1);
        if parsed < 1 {
            return Self(1);
        }
        Self(u32::try_from(parsed).unwrap_or(u32::MAX))
    }

    /// The normalized quantity.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// What an add-to-cart did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The full requested quantity was added.
    Added {
        /// Units added.
        added: u32,
        /// Line quantity after the add.
        quantity: u32,
    },
    /// Only part of the request fit within the stock.
    Clamped {
        /// Units added.
        added: u32,
        /// Line quantity after the add (equal to the stock).
        quantity: u32,
    },
    /// Nothing could be added: out of stock or the line is already at stock.
    Unchanged {
        /// Line quantity, unchanged.
        quantity: u32,
    },
}

impl AddOutcome {
    /// Line quantity after the operation.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        match *self {
            Self::Added { quantity, .. }
            | Self::Clamped { quantity, .. }
            | Self::Unchanged { quantity } => quantity,
        }
    }
}

/// Product id to quantity.
///
/// Serialized as a JSON object with string keys (`{"12": 3}`), which is how
/// it is stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<ProductId, u32>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `requested` units of a product that has `stock` units available.
    ///
    /// The amount added is `min(requested, max(0, stock - current))`; when
    /// that is zero the cart is left untouched.
    pub fn add(&mut self, product: ProductId, requested: RequestedQuantity, stock: u32) -> AddOutcome {
        let current = self.quantity(product);
        let allowed = stock.saturating_sub(current);
        let added = requested.get().min(allowed);

        if added == 0 {
            return AddOutcome::Unchanged { quantity: current };
        }

        let quantity = current + added;
        self.lines.insert(product, quantity);

        if added < requested.get() {
            AddOutcome::Clamped { added, quantity }
        } else {
            AddOutcome::Added { added, quantity }
        }
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product: ProductId) -> bool {
        self.lines.remove(&product).is_some()
    }

    /// Lower a line to the given stock, dropping it when stock is zero.
    ///
    /// Returns `true` when the line changed.
    pub fn clamp_to_stock(&mut self, product: ProductId, stock: u32) -> bool {
        match self.lines.get(&product).copied() {
            Some(quantity) if quantity > stock => {
                if stock == 0 {
                    self.lines.remove(&product);
                } else {
                    self.lines.insert(product, stock);
                }
                true
            }
            _ => false,
        }
    }

    /// Quantity of a product in the cart (zero when absent).
    #[must_use]
    pub fn quantity(&self, product: ProductId) -> u32 {
        self.lines.get(&product).copied().unwrap_or(0)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.values().fold(0, |acc, q| acc.saturating_add(*q))
    }

    /// Product ids in ascending order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.keys().copied().collect()
    }

    /// Iterate over `(product, quantity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.lines.iter().map(|(id, q)| (*id, *q))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// A cart line joined with the product's current name and price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}

/// Total of a priced cart. Used by both the cart page and checkout.
///
/// ```
/// use robo_shop_core::{CartLine, Price, ProductId, cart_total};
///
/// let lines = [
///     CartLine { product_id: ProductId::new(1), name: "Arm".into(), unit_price: Price::parse("10.50").unwrap(), quantity: 2 },
///     CartLine { product_id: ProductId::new(2), name: "Gear".into(), unit_price: Price::parse("3").unwrap(), quantity: 1 },
/// ];
/// assert_eq!(cart_total(&lines).to_string(), "24.00");
/// ```
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: u32) -> RequestedQuantity {
        RequestedQuantity::from_form(Some(&n.to_string()))
    }

    const P1: ProductId = ProductId::new(1);
    const P2: ProductId = ProductId::new(2);

    #[test]
    fn test_add_within_stock() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(P1, qty(2), 5),
            AddOutcome::Added {
                added: 2,
                quantity: 2
            }
        );
        assert_eq!(cart.quantity(P1), 2);
    }

    #[test]
    fn test_add_clamps_to_stock() {
        let mut cart = Cart::new();
        cart.add(P1, qty(3), 5);
        assert_eq!(
            cart.add(P1, qty(4), 5),
            AddOutcome::Clamped {
                added: 2,
                quantity: 5
            }
        );
        assert_eq!(cart.quantity(P1), 5);
    }

    #[test]
    fn test_add_at_stock_is_noop() {
        let mut cart = Cart::new();
        cart.add(P1, qty(5), 5);
        assert_eq!(cart.add(P1, qty(1), 5), AddOutcome::Unchanged { quantity: 5 });
    }

    #[test]
    fn test_add_out_of_stock_does_not_create_line() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(P1, qty(1), 0), AddOutcome::Unchanged { quantity: 0 });
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_when_stock_dropped_below_cart() {
        let mut cart = Cart::new();
        cart.add(P1, qty(4), 4);
        // Stock later fell to 2; the existing line is left alone.
        assert_eq!(cart.add(P1, qty(1), 2), AddOutcome::Unchanged { quantity: 4 });
    }

    #[test]
    fn test_add_result_is_min_of_sum_and_stock() {
        for stock in 0..6_u32 {
            for current in 0..=stock {
                for requested in 1..8_u32 {
                    let mut cart = Cart::new();
                    if current > 0 {
                        cart.add(P1, qty(current), stock);
                    }
                    let outcome = cart.add(P1, qty(requested), stock);
                    let expected = (current + requested).min(stock);
                    assert_eq!(cart.quantity(P1), expected);
                    assert_eq!(outcome.quantity(), expected);
                }
            }
        }
    }

    #[test]
    fn test_requested_quantity_large_input() {
        assert_eq!(
            RequestedQuantity::from_form(Some("99999999999")).get(),
            u32::MAX
        );
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add(P1, qty(1), 3);
        assert!(cart.remove(P1));
        assert!(!cart.remove(P1));
        assert!(!cart.remove(P2));
    }

    #[test]
    fn test_clamp_to_stock() {
        let mut cart = Cart::new();
        cart.add(P1, qty(4), 4);
        cart.add(P2, qty(2), 2);
        assert!(cart.clamp_to_stock(P1, 3));
        assert_eq!(cart.quantity(P1), 3);
        assert!(cart.clamp_to_stock(P2, 0));
        assert_eq!(cart.len(), 1);
        assert!(!cart.clamp_to_stock(P1, 10));
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add(P1, qty(2), 9);
        cart.add(P2, qty(3), 9);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.product_ids(), vec![P1, P2]);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_session_json_shape() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(12), qty(3), 10);
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value, serde_json::json!({"12": 3}));

        let back: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(back.quantity(ProductId::new(12)), 3);
    }

    #[test]
    fn test_cart_total_sums_line_totals() {
        let lines = vec![
            CartLine {
                product_id: P1,
                name: "Servo".to_owned(),
                unit_price: Price::parse("12.25").unwrap(),
                quantity: 4,
            },
            CartLine {
                product_id: P2,
                name: "Chassis".to_owned(),
                unit_price: Price::parse("100").unwrap(),
                quantity: 1,
            },
        ];
        assert_eq!(cart_total(&lines), Decimal::new(14900, 2));
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }
}
