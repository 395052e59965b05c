//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup validation, password hashing and login
//! - `cart` - Session cart operations priced against the catalog
//! - `checkout` - Checkout form validation and order placement
//! - `media` - Product image storage

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod media;
