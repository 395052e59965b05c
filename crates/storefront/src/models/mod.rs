//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod payment;
pub mod product;
pub mod session;
pub mod user;

pub use payment::{Order, OrderLine, Payment};
pub use product::{Product, ProductDraft, ProductErrors, ProductInput, ProductListing};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Seller, User};
