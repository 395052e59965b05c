//! Seed the storefront database with demo data.
//!
//! Creates one seller with a few products and one buyer. Accounts are matched
//! by username, so running the command again changes nothing.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `SEED_PASSWORD` - Password for the demo accounts (default `robo-demo-pass`)

use tracing::info;

use robo_shop_core::{Email, Role, Username};
use robo_shop_storefront::db::{self, ProductRepository, UserRepository};
use robo_shop_storefront::models::{ProductDraft, ProductInput, User};
use robo_shop_storefront::services::auth::hash_password;

use super::{CommandError, database_url};

const DEFAULT_PASSWORD: &str = "robo-demo-pass";

/// A demo account to create.
struct DemoAccount {
    username: &'static str,
    email: &'static str,
    role: Role,
}

const DEMO_SELLER: DemoAccount = DemoAccount {
    username: "demo_seller",
    email: "seller@robo-shop.dz",
    role: Role::Seller,
};

const DEMO_BUYER: DemoAccount = DemoAccount {
    username: "demo_buyer",
    email: "buyer@robo-shop.dz",
    role: Role::Buyer,
};

/// Demo catalog: name, price, stock, description.
const DEMO_PRODUCTS: &[(&str, &str, &str, &str)] = &[
    (
        "Arduino Uno R3",
        "3200.00",
        "25",
        "Microcontroller board based on the ATmega328P.",
    ),
    (
        "Servo SG90",
        "450.00",
        "120",
        "Micro servo, 180 degrees, 1.8 kg/cm.",
    ),
    (
        "HC-SR04 Ultrasonic Sensor",
        "380.00",
        "60",
        "Distance sensor, 2 cm to 400 cm.",
    ),
    (
        "L298N Motor Driver",
        "850.00",
        "3",
        "Dual H-bridge driver for DC and stepper motors.",
    ),
];

/// The validated demo catalog.
fn demo_drafts() -> Result<Vec<ProductDraft>, CommandError> {
    DEMO_PRODUCTS
        .iter()
        .map(|(name, price, stock, description)| {
            let input = ProductInput {
                name: (*name).to_string(),
                price: (*price).to_string(),
                stock: (*stock).to_string(),
                description: (*description).to_string(),
            };
            ProductDraft::validate(&input)
                .map_err(|e| CommandError::InvalidSeed(format!("product {name}: {e:?}")))
        })
        .collect()
}

/// Create the demo seller, buyer and products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn demo_data() -> Result<(), CommandError> {
    let database_url = database_url()?;
    let password = std::env::var("SEED_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());
    let drafts = demo_drafts()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let seller = ensure_account(&pool, &DEMO_SELLER, &password).await?;
    ensure_account(&pool, &DEMO_BUYER, &password).await?;

    let Some(seller_id) = seller.seller_id else {
        return Err(CommandError::InvalidSeed(format!(
            "{} exists but is not a seller",
            DEMO_SELLER.username
        )));
    };

    let products = ProductRepository::new(&pool);
    if products.list_by_seller(seller_id).await?.is_empty() {
        for draft in &drafts {
            let product = products.create(seller_id, draft, None).await?;
            info!(product_id = %product.id, name = %product.name, "Created product");
        }
    } else {
        info!("Demo products already exist, skipping");
    }

    info!("Seeding complete!");
    info!("  Seller: {}", DEMO_SELLER.username);
    info!("  Buyer: {}", DEMO_BUYER.username);
    Ok(())
}

/// Look up an account by username, creating it when missing.
async fn ensure_account(
    pool: &sqlx::PgPool,
    account: &DemoAccount,
    password: &str,
) -> Result<User, CommandError> {
    let username = Username::parse(account.username)
        .map_err(|e| CommandError::InvalidSeed(e.to_string()))?;
    let users = UserRepository::new(pool);

    if let Some(user) = users.get_by_username(&username).await? {
        info!(username = %username, "Account already exists, skipping");
        return Ok(user);
    }

    let email =
        Email::parse(account.email).map_err(|e| CommandError::InvalidSeed(e.to_string()))?;
    let hash = hash_password(password).map_err(|e| CommandError::InvalidSeed(e.to_string()))?;
    let user = users
        .create_with_password(&username, &email, &hash, account.role)
        .await?;
    info!(username = %username, role = ?account.role, "Created account");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_is_valid() {
        let drafts = demo_drafts().expect("demo products should validate");
        assert_eq!(drafts.len(), DEMO_PRODUCTS.len());
        assert!(drafts.iter().all(|d| !d.name.is_empty()));
    }

    #[test]
    fn test_demo_usernames_are_valid() {
        assert!(Username::parse(DEMO_SELLER.username).is_ok());
        assert!(Username::parse(DEMO_BUYER.username).is_ok());
        assert!(Email::parse(DEMO_SELLER.email).is_ok());
        assert!(Email::parse(DEMO_BUYER.email).is_ok());
    }
}
