//! Account pages for logged-in users.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use super::Nav;
use crate::db::{OrderRepository, PaymentRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Order, Payment};
use crate::state::AppState;

/// Payment history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/payments.html")]
pub struct PaymentsTemplate {
    pub nav: Nav,
    pub payments: Vec<Payment>,
    pub orders: Vec<Order>,
}

/// The user's payments and orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn payments(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<PaymentsTemplate, AppError> {
    let payments = PaymentRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(PaymentsTemplate {
        nav: Nav::for_user(Some(&user)),
        payments,
        orders,
    })
}
