//! Integration tests for Robo Shop.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the storefront against a scratch database
//! cargo run -p robo-shop-cli -- migrate
//! cargo run -p robo-shop-storefront
//!
//! # Run integration tests
//! cargo test -p robo-shop-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Running storefront (default `http://localhost:3000`)
//! - `STOREFRONT_DATABASE_URL` - Same database the storefront uses, for fixtures

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use robo_shop_core::{Price, ProductId, Username};
use robo_shop_storefront::db::{self, ProductRepository, UserRepository};
use robo_shop_storefront::models::ProductDraft;

/// Password used for every account the tests create.
pub const TEST_PASSWORD: &str = "Gr1pper-Arm-2026";

/// Base URL for the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A unique username for this test run.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// A browser-like client: keeps cookies, never follows redirects.
///
/// Each client claims its own `X-Forwarded-For` address so parallel tests
/// do not share one login rate-limit bucket.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn browser() -> Client {
    let [a, b, c, ..] = *Uuid::new_v4().as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect response.
///
/// # Panics
///
/// Panics if the response carries no valid `Location`.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect without Location")
        .to_string()
}

/// Shared handles for a test.
pub struct TestContext {
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the storefront database.
    ///
    /// # Panics
    ///
    /// Panics if no database URL is configured or the connection fails.
    pub async fn new() -> Self {
        let database_url = std::env::var("STOREFRONT_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("STOREFRONT_DATABASE_URL must be set for integration tests");
        let pool = db::create_pool(&SecretString::from(database_url))
            .await
            .expect("Failed to connect to storefront database");

        Self {
            base_url: storefront_url(),
            pool,
        }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sign up through the form; the returned client is logged in.
    ///
    /// # Panics
    ///
    /// Panics if signup does not redirect.
    pub async fn signup(&self, username: &str, role: &str) -> Client {
        let client = browser();
        let resp = client
            .post(self.url("/signup/"))
            .form(&[
                ("username", username),
                ("email", &format!("{username}@example.dz")),
                ("password1", TEST_PASSWORD),
                ("password2", TEST_PASSWORD),
                ("role", role),
            ])
            .send()
            .await
            .expect("Failed to submit signup");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "signup should redirect");
        client
    }

    /// Create a product for an existing seller directly in the database.
    ///
    /// # Panics
    ///
    /// Panics if the user is missing, is not a seller, or the insert fails.
    pub async fn create_product(&self, seller: &str, name: &str, price: &str, stock: u32) -> ProductId {
        let username = Username::parse(seller).expect("valid username");
        let user = UserRepository::new(&self.pool)
            .get_by_username(&username)
            .await
            .expect("user lookup failed")
            .expect("seller should exist");
        let seller_id = user.seller_id.expect("user should be a seller");

        let draft = ProductDraft {
            name: name.to_string(),
            price: Price::parse(price).expect("valid price"),
            stock,
            description: String::new(),
        };
        ProductRepository::new(&self.pool)
            .create(seller_id, &draft, None)
            .await
            .expect("product insert failed")
            .id
    }

    /// Current stock of a product.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn stock_of(&self, id: ProductId) -> u32 {
        ProductRepository::new(&self.pool)
            .get_by_id(id)
            .await
            .expect("product lookup failed")
            .expect("product should exist")
            .stock
    }
}
