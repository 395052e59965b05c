//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user (and optionally a role)
//! in route handlers.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use robo_shop_core::{Role, SellerId};

use crate::models::{CurrentUser, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/login/";

/// Where non-sellers are sent from seller-only pages.
pub const PRODUCT_LIST_PATH: &str = "/store/products/";

/// Extractor that requires a logged-in user.
///
/// If the user is not logged in, returns a redirect to the login page that
/// carries the requested path in `next`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in seller.
///
/// Buyers are redirected to the product list.
pub struct RequireSeller(pub CurrentUser, pub SellerId);

/// Extractor that requires a logged-in buyer.
///
/// Sellers are redirected to the home page.
pub struct RequireBuyer(pub CurrentUser);

/// Error returned when the request does not carry the required identity.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to `next`.
    RedirectToLogin { next: String },
    /// Logged in with the wrong role; redirect elsewhere.
    RedirectTo(&'static str),
    /// No session layer; a wiring bug rather than a client error.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::RedirectTo(path) => Redirect::to(path).into_response(),
            Self::MissingSession => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Login URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Validate a `next` parameter: only same-site absolute paths are followed.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

async fn session_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::MissingSession)?;

    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => Ok(user),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Session store unavailable; treating request as anonymous"
            );
            Ok(None)
        }
    }
}

/// Path and query as the client sent them, before any `nest` prefix was
/// stripped.
fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

async fn required_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    session_user(parts)
        .await?
        .ok_or_else(|| AuthRejection::RedirectToLogin {
            next: requested_path(parts),
        })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(required_user(parts).await?))
    }
}

impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = required_user(parts).await?;
        match user.seller_id {
            Some(seller_id) => Ok(Self(user, seller_id)),
            None => Err(AuthRejection::RedirectTo(PRODUCT_LIST_PATH)),
        }
    }
}

impl<S> FromRequestParts<S> for RequireBuyer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = required_user(parts).await?;
        if user.role() == Role::Seller {
            return Err(AuthRejection::RedirectTo("/"));
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.ok().flatten()))
    }
}

/// Log a user in: rotate the session ID, then store the identity.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out: drop the whole session, cart included.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, Uri};

    use super::*;

    #[test]
    fn test_requested_path_prefers_original_uri() {
        let (mut parts, ()) = Request::builder()
            .uri("/products/5/edit/")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(OriginalUri(Uri::from_static(
            "/store/products/5/edit/?from=dashboard",
        )));

        assert_eq!(requested_path(&parts), "/store/products/5/edit/?from=dashboard");
    }

    #[test]
    fn test_requested_path_falls_back_to_request_uri() {
        let (parts, ()) = Request::builder()
            .uri("/cart/")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(requested_path(&parts), "/cart/");
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(login_url("/cart/"), "/login/?next=%2Fcart%2F");
        assert_eq!(
            login_url("/store/products/?page=2"),
            "/login/?next=%2Fstore%2Fproducts%2F%3Fpage%3D2"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/cart/")), Some("/cart/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
