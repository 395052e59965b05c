//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and Sentry scope)
//! 4. Security headers
//! 5. Allowed hosts (400 for unknown `Host`)
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! The login and signup POST handlers additionally carry the governor rate
//! limiter, and handlers pick the identity they need with the extractors in
//! [`auth`].

pub mod allowed_hosts;
pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use allowed_hosts::allowed_hosts_middleware;
pub use auth::{
    OptionalAuth, RequireAuth, RequireBuyer, RequireSeller, clear_current_user, set_current_user,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
