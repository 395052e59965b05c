//! Checkout form and confirmation.
//!
//! Anyone but a seller may check out; anonymous payments are recorded
//! without a user and without an order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use robo_shop_core::{Capability, PaymentId, PaymentMethod, Wilaya};

use super::Nav;
use crate::db::PaymentRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, Payment, session_keys};
use crate::services::cart::{CartService, PricedCart};
use crate::services::checkout::{CheckoutError, CheckoutInput, CheckoutService};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub payment_method: String,
}

impl From<&CheckoutForm> for CheckoutInput {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone: form.phone.clone(),
            state: form.state.clone(),
            payment_method: form.payment_method.clone(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "sales/checkout.html")]
pub struct CheckoutTemplate {
    pub nav: Nav,
    pub cart: PricedCart,
    pub states: Vec<Wilaya>,
    pub methods: [PaymentMethod; 2],
    pub form: CheckoutForm,
    pub error: Option<&'static str>,
}

/// Checkout success template.
#[derive(Template, WebTemplate)]
#[template(path = "sales/success.html")]
pub struct SuccessTemplate {
    pub nav: Nav,
    pub payment: Option<Payment>,
}

/// Sellers have no cart; send them home.
fn seller_redirect(user: Option<&CurrentUser>) -> Option<Response> {
    user.filter(|u| !u.principal().can(Capability::Checkout))
        .map(|_| Redirect::to("/").into_response())
}

async fn render(
    service: &CheckoutService<'_>,
    user: Option<&CurrentUser>,
    form: CheckoutForm,
    error: Option<&'static str>,
) -> Result<Response, AppError> {
    let cart = service.summary().await?;
    Ok(CheckoutTemplate {
        nav: Nav::for_user(user),
        cart,
        states: Wilaya::all().collect(),
        methods: PaymentMethod::ALL,
        form,
        error,
    }
    .into_response())
}

/// Display the checkout form with the cart total.
#[instrument(skip(state, session, user))]
pub async fn form(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    if let Some(redirect) = seller_redirect(user.as_ref()) {
        return Ok(redirect);
    }
    let service = CheckoutService::new(state.pool(), &session);
    render(&service, user.as_ref(), CheckoutForm::default(), None).await
}

/// Place the order.
///
/// Validation and stock problems re-render the form with a message; on
/// success the cart is emptied and the buyer lands on the success page.
#[instrument(skip(state, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = seller_redirect(user.as_ref()) {
        return Ok(redirect);
    }

    let service = CheckoutService::new(state.pool(), &session);
    let principal = user.as_ref().map(CurrentUser::principal);

    match service.submit(principal, &CheckoutInput::from(&form)).await {
        Ok(receipt) => {
            CartService::new(state.pool(), &session).clear().await?;
            session
                .insert(session_keys::LAST_PAYMENT, receipt.payment.id)
                .await?;
            let payment_id = receipt.payment.id.to_string();
            add_breadcrumb("checkout", "Order placed", Some(&[("payment_id", payment_id.as_str())]));
            Ok(Redirect::to("/checkout/success/").into_response())
        }
        Err(e) => match e.user_message() {
            Some(message) => {
                if let CheckoutError::StockChanged(shortages) = &e {
                    tracing::info!(count = shortages.len(), "Checkout re-rendered after stock change");
                }
                render(&service, user.as_ref(), form, Some(message)).await
            }
            None => Err(e.into()),
        },
    }
}

/// Confirmation page. Shows the payment just recorded by this session, once.
#[instrument(skip(state, session, user))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<SuccessTemplate, AppError> {
    let payment = match session
        .remove::<PaymentId>(session_keys::LAST_PAYMENT)
        .await?
    {
        Some(id) => PaymentRepository::new(state.pool()).get_by_id(id).await?,
        None => None,
    };

    Ok(SuccessTemplate {
        nav: Nav::for_user(user.as_ref()),
        payment,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use robo_shop_core::{SellerId, UserId, Username};

    use super::*;

    #[test]
    fn test_sellers_are_redirected() {
        let seller = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("atelier").unwrap(),
            seller_id: Some(SellerId::new(1)),
        };
        let buyer = CurrentUser {
            seller_id: None,
            ..seller.clone()
        };
        assert!(seller_redirect(Some(&seller)).is_some());
        assert!(seller_redirect(Some(&buyer)).is_none());
        assert!(seller_redirect(None).is_none());
    }

    #[test]
    fn test_form_maps_to_input() {
        let form = CheckoutForm {
            first_name: "Amine".to_string(),
            state: "Oran".to_string(),
            ..CheckoutForm::default()
        };
        let input = CheckoutInput::from(&form);
        assert_eq!(input.first_name, "Amine");
        assert_eq!(input.state, "Oran");
        assert!(input.payment_method.is_empty());
    }
}
