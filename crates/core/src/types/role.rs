//! Account roles and the authorization policy.
//!
//! A user is a seller exactly when a seller profile exists for them; the role
//! chosen at signup only decides whether that profile gets created. Every
//! authorization decision in the storefront goes through [`Principal::can`]
//! and [`Principal::owns`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{SellerId, UserId};

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0:?} (expected \"buyer\" or \"seller\")")]
pub struct RoleError(pub String);

/// Role chosen on the signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
}

impl Role {
    /// All roles, in the order offered on the signup form.
    pub const ALL: [Self; 2] = [Self::Buyer, Self::Seller];

    /// Form value for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buyer => "Buyer",
            Self::Seller => "Seller",
        }
    }

    /// Where a user with this role lands after signup or login.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Buyer => "/store/products/",
            Self::Seller => "/store/dashboard/",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            other => Err(RoleError(other.to_owned())),
        }
    }
}

/// Something a principal may or may not be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Add, edit or delete products and open the seller dashboard.
    ManageProducts,
    /// Add to, view, or remove from the shopping cart.
    UseCart,
    /// Submit the checkout form.
    Checkout,
}

/// The authenticated identity that authorization decisions are made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The logged-in user.
    pub user_id: UserId,
    /// The user's seller profile, if they have one.
    pub seller_id: Option<SellerId>,
}

impl Principal {
    /// Create a principal for a user with an optional seller profile.
    #[must_use]
    pub const fn new(user_id: UserId, seller_id: Option<SellerId>) -> Self {
        Self { user_id, seller_id }
    }

    /// Effective role: seller iff a seller profile exists.
    #[must_use]
    pub const fn role(&self) -> Role {
        if self.seller_id.is_some() {
            Role::Seller
        } else {
            Role::Buyer
        }
    }

    /// Whether this principal holds a seller profile.
    #[must_use]
    pub const fn is_seller(&self) -> bool {
        self.seller_id.is_some()
    }

    /// Check a capability.
    ///
    /// Sellers manage products and are kept out of the buyer flows; buyers
    /// shop and check out but cannot manage products.
    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageProducts => self.is_seller(),
            Capability::UseCart | Capability::Checkout => !self.is_seller(),
        }
    }

    /// Whether this principal owns products of the given seller.
    #[must_use]
    pub fn owns(&self, seller_id: SellerId) -> bool {
        self.seller_id == Some(seller_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn buyer() -> Principal {
        Principal::new(UserId::new(1), None)
    }

    fn seller(id: i32) -> Principal {
        Principal::new(UserId::new(2), Some(SellerId::new(id)))
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("buyer".parse::<Role>().unwrap(), Role::Buyer);
        assert_eq!(" seller ".parse::<Role>().unwrap(), Role::Seller);
        assert!("admin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_round_trips() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_buyer_capabilities() {
        let p = buyer();
        assert_eq!(p.role(), Role::Buyer);
        assert!(!p.can(Capability::ManageProducts));
        assert!(p.can(Capability::UseCart));
        assert!(p.can(Capability::Checkout));
    }

    #[test]
    fn test_seller_capabilities() {
        let p = seller(5);
        assert_eq!(p.role(), Role::Seller);
        assert!(p.can(Capability::ManageProducts));
        assert!(!p.can(Capability::UseCart));
        assert!(!p.can(Capability::Checkout));
    }

    #[test]
    fn test_ownership() {
        assert!(seller(5).owns(SellerId::new(5)));
        assert!(!seller(5).owns(SellerId::new(6)));
        assert!(!buyer().owns(SellerId::new(5)));
    }

    #[test]
    fn test_landing_paths() {
        assert_eq!(buyer().role().landing_path(), "/store/products/");
        assert_eq!(seller(1).role().landing_path(), "/store/dashboard/");
    }
}
