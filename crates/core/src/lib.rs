//! Robo Shop Core - Domain types and rules.
//!
//! This crate provides the types and business rules shared by all Robo Shop
//! components:
//! - `storefront` - The web application (accounts, store, cart, checkout)
//! - `cli` - Command-line tools for migrations, seeding and deployment checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Database encoding for the newtypes is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, usernames, emails, prices, roles,
//!   wilayas and payment methods
//! - [`cart`] - The session cart and its stock-clamping rule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{AddOutcome, Cart, CartLine, RequestedQuantity, cart_total};
pub use types::*;
