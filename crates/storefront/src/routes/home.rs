//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use super::Nav;
use crate::filters;
use crate::middleware::OptionalAuth;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    /// Where the main call to action leads for this visitor.
    pub start_path: &'static str,
}

/// Display the home page.
#[instrument(skip(user))]
pub async fn home(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let start_path = user
        .as_ref()
        .map_or("/signup/", |u| u.role().landing_path());

    HomeTemplate {
        nav: Nav::for_user(user.as_ref()),
        start_path,
    }
}
