//! Signup, login and logout.
//!
//! Successful signup and login both rotate the session ID and redirect by
//! role: sellers to their dashboard, buyers to the product list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::Nav;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::{LOGIN_PATH, safe_next};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService, SignupErrors, SignupInput};
use crate::state::AppState;

/// Shown on the login form for any authentication failure.
pub const INVALID_LOGIN_MESSAGE: &str = "البيانات غير صحيحة";

// =============================================================================
// Form Types
// =============================================================================

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub role: String,
}

impl From<&SignupForm> for SignupInput {
    fn from(form: &SignupForm) -> Self {
        Self {
            username: form.username.clone(),
            email: form.email.clone(),
            password1: form.password1.clone(),
            password2: form.password2.clone(),
            role: form.role.clone(),
        }
    }
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// `?next=` on the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub role: String,
    pub errors: SignupErrors,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "accounts/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub error: Option<&'static str>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Put the user in the session and tag Sentry events with them.
async fn log_in(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.username.as_str()));
    Ok(())
}

fn landing(user: &User) -> &'static str {
    CurrentUser::from(user).role().landing_path()
}

// =============================================================================
// Signup
// =============================================================================

/// Display the signup page.
pub async fn signup_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    SignupTemplate {
        nav: Nav::for_user(user.as_ref()),
        username: String::new(),
        email: String::new(),
        role: "buyer".to_string(),
        errors: SignupErrors::default(),
    }
}

/// Handle signup form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.pool())
        .signup(&SignupInput::from(&form))
        .await
    {
        Ok(user) => {
            log_in(&session, &user).await?;
            tracing::info!(user_id = %user.id, seller = user.seller_id.is_some(), "User signed up");
            Ok(Redirect::to(landing(&user)).into_response())
        }
        Err(AuthError::Invalid(errors)) => Ok(SignupTemplate {
            nav: Nav::default(),
            username: form.username,
            email: form.email,
            role: form.role,
            errors,
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        nav: Nav::for_user(user.as_ref()),
        username: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_string(),
        error: None,
    }
}

/// Handle login form submission.
///
/// A safe `next` path wins over the role-based landing page.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).map(str::to_string);

    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            log_in(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            let target = next.unwrap_or_else(|| landing(&user).to_string());
            Ok(Redirect::to(&target).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed");
            Ok(LoginTemplate {
                nav: Nav::default(),
                username: form.username,
                next: next.unwrap_or_default(),
                error: Some(INVALID_LOGIN_MESSAGE),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out and go back to the login page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to(LOGIN_PATH))
}
