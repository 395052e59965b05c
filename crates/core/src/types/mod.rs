//! Core types for Robo Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod id;
pub mod payment;
pub mod price;
pub mod role;
pub mod wilaya;

pub use account::{Email, EmailError, Username, UsernameError};
pub use id::*;
pub use payment::{PaymentMethod, PaymentMethodError};
pub use price::{Price, PriceError};
pub use role::{Capability, Principal, Role, RoleError};
pub use wilaya::{Wilaya, WilayaError};
