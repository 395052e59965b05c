//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use robo_shop_core::{Principal, Role, SellerId, UserId, Username};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and
/// answer authorization questions without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Login name, shown in the navigation bar.
    pub username: Username,
    /// Seller profile, when the user is a seller.
    pub seller_id: Option<SellerId>,
}

impl CurrentUser {
    /// The identity authorization decisions are made on.
    #[must_use]
    pub const fn principal(&self) -> Principal {
        Principal::new(self.id, self.seller_id)
    }

    /// Effective role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.principal().role()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            seller_id: user.seller_id,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart (product id to quantity).
    pub const CART: &str = "cart";

    /// Key for a one-shot notice shown on the next cart page render.
    pub const CART_NOTICE: &str = "cart_notice";

    /// Key for the id of the payment recorded by the last checkout.
    pub const LAST_PAYMENT: &str = "last_payment";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_follows_seller_profile() {
        let mut user = CurrentUser {
            id: UserId::new(4),
            username: Username::parse("amina").unwrap(),
            seller_id: None,
        };
        assert_eq!(user.role(), Role::Buyer);

        user.seller_id = Some(SellerId::new(9));
        assert_eq!(user.role(), Role::Seller);
        assert!(user.principal().owns(SellerId::new(9)));
    }

    #[test]
    fn test_session_round_trip() {
        let user = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("yacine").unwrap(),
            seller_id: Some(SellerId::new(2)),
        };
        let value = serde_json::to_value(&user).unwrap();
        let back: CurrentUser = serde_json::from_value(value).unwrap();
        assert_eq!(back.principal(), user.principal());
        assert_eq!(back.username, user.username);
    }
}
