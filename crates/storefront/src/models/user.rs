//! User and seller domain types.

use chrono::{DateTime, Utc};

use robo_shop_core::{Email, SellerId, UserId, Username};

/// A storefront account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Contact email.
    pub email: Email,
    /// Seller profile, when the user is a seller.
    pub seller_id: Option<SellerId>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// A seller profile.
#[derive(Debug, Clone)]
pub struct Seller {
    pub id: SellerId,
    pub user_id: UserId,
    pub phone: String,
    pub address: String,
}
