//! Session-backed shopping cart.
//!
//! The cart lives in the session under [`session_keys::CART`]. Every mutation
//! is a read-modify-write of the session record; two concurrent requests from
//! the same browser can race, and the last write wins.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use robo_shop_core::{AddOutcome, Cart, CartLine, ProductId, RequestedQuantity, cart_total};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::session_keys;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist (or no longer exists).
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A cart joined with current product names and prices.
#[derive(Debug, Clone, Default)]
pub struct PricedCart {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl PricedCart {
    /// Whether there is nothing to check out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Load the cart from the session; a missing or unreadable cart is empty.
///
/// # Errors
///
/// Returns `CartError::Session` if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, CartError> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns `CartError::Session` if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), CartError> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Cart operations for one request.
pub struct CartService<'a> {
    products: ProductRepository<'a>,
    session: &'a Session,
}

impl<'a> CartService<'a> {
    /// Create a cart service bound to the request's session.
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self {
            products: ProductRepository::new(pool),
            session,
        }
    }

    /// Add a product, never letting its line exceed the current stock.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    pub async fn add(
        &self,
        product_id: ProductId,
        requested: RequestedQuantity,
    ) -> Result<AddOutcome, CartError> {
        let product = self
            .products
            .get_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let mut cart = load_cart(self.session).await?;
        let outcome = cart.add(product_id, requested, product.stock);
        if !matches!(outcome, AddOutcome::Unchanged { .. }) {
            save_cart(self.session, &cart).await?;
        }

        tracing::info!(
            product_id = %product_id,
            requested = requested.get(),
            stock = product.stock,
            quantity = outcome.quantity(),
            "Cart add"
        );
        Ok(outcome)
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session store fails.
    pub async fn remove(&self, product_id: ProductId) -> Result<bool, CartError> {
        let mut cart = load_cart(self.session).await?;
        let removed = cart.remove(product_id);
        if removed {
            save_cart(self.session, &cart).await?;
        }
        Ok(removed)
    }

    /// Price every line with the product's current name and price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if a product in the cart has
    /// since been deleted.
    pub async fn view(&self) -> Result<PricedCart, CartError> {
        let cart = load_cart(self.session).await?;
        price_cart(&self.products, &cart).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session store fails.
    pub async fn clear(&self) -> Result<(), CartError> {
        save_cart(self.session, &Cart::new()).await
    }
}

/// Join a cart with product rows and compute the shared total.
pub(crate) async fn price_cart(
    products: &ProductRepository<'_>,
    cart: &Cart,
) -> Result<PricedCart, CartError> {
    let found = products.get_many(&cart.product_ids()).await?;

    let mut lines = Vec::with_capacity(cart.len());
    for (product_id, quantity) in cart.iter() {
        let product = found
            .iter()
            .find(|p| p.id == product_id)
            .ok_or(CartError::ProductNotFound(product_id))?;
        lines.push(CartLine {
            product_id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        });
    }

    let total = cart_total(&lines);
    Ok(PricedCart { lines, total })
}
