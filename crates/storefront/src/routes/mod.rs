//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET       /                              - Home page
//! GET       /health                        - Liveness
//! GET       /health/ready                  - Database readiness
//!
//! # Accounts
//! GET, POST /signup/                       - Signup (buyer or seller)
//! GET, POST /login/                        - Login (rate limited POST)
//! GET, POST /logout/                       - Logout
//!
//! # Store (login required)
//! GET       /store/products/               - Product list
//! GET       /store/products/{id}/          - Product detail
//! GET, POST /store/dashboard/              - Seller dashboard with inline add form
//! GET, POST /store/products/add/           - Add product (sellers only, 403 otherwise)
//! GET, POST /store/products/{id}/edit/     - Edit own product
//! POST      /store/products/{id}/delete/   - Delete own product
//!
//! # Cart (buyers only)
//! GET       /cart/                         - Cart page
//! GET, POST /cart/add/{product_id}/        - Add with stock clamping
//! POST      /cart/remove/{product_id}/     - Remove line
//!
//! # Checkout
//! GET, POST /checkout/                     - Checkout form
//! GET       /checkout/success/             - Confirmation
//!
//! # Account (login required)
//! GET       /account/payments/             - Payment and order history
//! ```

pub mod account;
pub mod accounts;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod store;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::models::CurrentUser;
use crate::services::media::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Headroom over the image size for the other multipart fields.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Navigation bar data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub username: Option<String>,
    pub is_seller: bool,
}

impl Nav {
    /// Navigation for the given (optional) user.
    #[must_use]
    pub fn for_user(user: Option<&CurrentUser>) -> Self {
        user.map_or_else(Self::default, |user| Self {
            username: Some(user.username.to_string()),
            is_seller: user.seller_id.is_some(),
        })
    }

    /// Whether someone is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/signup/",
            get(accounts::signup_page).post(accounts::signup.layer(auth_rate_limiter())),
        )
        .route(
            "/login/",
            get(accounts::login_page).post(accounts::login.layer(auth_rate_limiter())),
        )
        .route("/logout/", get(accounts::logout).post(accounts::logout))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(store::product_list))
        .route("/products/{id}/", get(store::product_detail))
        .route(
            "/dashboard/",
            get(store::dashboard).post(store::dashboard_create),
        )
        .route(
            "/products/add/",
            get(store::add_product_page).post(store::add_product),
        )
        .route(
            "/products/{id}/edit/",
            get(store::edit_product_page).post(store::edit_product),
        )
        .route("/products/{id}/delete/", post(store::delete_product))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES))
}

/// Create the cart routes router.
///
/// Registered with full paths and merged: a nested `/` only matches the
/// prefix without its trailing slash.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(cart::show))
        .route(
            "/cart/add/{product_id}/",
            get(cart::add_redirect).post(cart::add),
        )
        .route("/cart/remove/{product_id}/", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout/", get(checkout::form).post(checkout::submit))
        .route("/checkout/success/", get(checkout::success))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(account_routes())
        .nest("/store", store_routes())
        .merge(cart_routes())
        .merge(checkout_routes())
        .route("/account/payments/", get(account::payments))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use robo_shop_core::{SellerId, UserId, Username};

    use super::*;

    #[test]
    fn test_nav_for_user() {
        assert!(!Nav::for_user(None).is_authenticated());

        let seller = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("atelier").unwrap(),
            seller_id: Some(SellerId::new(3)),
        };
        let nav = Nav::for_user(Some(&seller));
        assert_eq!(nav.username.as_deref(), Some("atelier"));
        assert!(nav.is_seller);
    }
}
