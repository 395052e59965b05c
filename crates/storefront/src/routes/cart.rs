//! Cart route handlers.
//!
//! The cart is for buyers only; sellers are sent back to the home page.
//! Adds never push a line past the product's stock, and a one-shot notice
//! tells the buyer when less than requested was added.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use robo_shop_core::{AddOutcome, ProductId, RequestedQuantity};

use super::Nav;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireBuyer;
use crate::models::session_keys;
use crate::services::cart::{CartService, PricedCart};
use crate::state::AppState;

const CART_PATH: &str = "/cart/";

/// Notice when only part of the requested quantity fit in stock.
pub const CLAMPED_NOTICE: &str = "الكمية المطلوبة أكبر من المخزون المتوفر، تمت إضافة الكمية المتاحة فقط";

/// Notice when nothing more could be added.
pub const UNCHANGED_NOTICE: &str = "لا يوجد مخزون إضافي لهذا المنتج";

/// Add to cart form data. `quantity` stays raw; bad values mean 1.
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/cart.html")]
pub struct CartTemplate {
    pub nav: Nav,
    pub cart: PricedCart,
    pub notice: Option<String>,
}

/// The notice to show after an add, if any.
#[must_use]
pub const fn notice_for(outcome: &AddOutcome) -> Option<&'static str> {
    match outcome {
        AddOutcome::Added { .. } => None,
        AddOutcome::Clamped { .. } => Some(CLAMPED_NOTICE),
        AddOutcome::Unchanged { .. } => Some(UNCHANGED_NOTICE),
    }
}

/// Display the cart.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(user): RequireBuyer,
) -> Result<CartTemplate, AppError> {
    let cart = CartService::new(state.pool(), &session).view().await?;
    let notice = session.remove::<String>(session_keys::CART_NOTICE).await?;

    Ok(CartTemplate {
        nav: Nav::for_user(Some(&user)),
        cart,
        notice,
    })
}

/// Add a product to the cart, clamped to its stock.
#[instrument(skip(state, session, _user, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(_user): RequireBuyer,
    Path(product_id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let requested = RequestedQuantity::from_form(form.quantity.as_deref());
    let outcome = CartService::new(state.pool(), &session)
        .add(product_id, requested)
        .await?;

    if let Some(notice) = notice_for(&outcome) {
        session.insert(session_keys::CART_NOTICE, notice).await?;
    }

    Ok(Redirect::to(CART_PATH))
}

/// Adding is POST only; a GET goes back to the product list.
pub async fn add_redirect(RequireBuyer(_user): RequireBuyer) -> Redirect {
    Redirect::to("/store/products/")
}

/// Remove a product's line from the cart.
#[instrument(skip(state, session, _user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(_user): RequireBuyer,
    Path(product_id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    CartService::new(state.pool(), &session)
        .remove(product_id)
        .await?;
    Ok(Redirect::to(CART_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_for_outcome() {
        assert_eq!(
            notice_for(&AddOutcome::Added {
                added: 2,
                quantity: 2
            }),
            None
        );
        assert_eq!(
            notice_for(&AddOutcome::Clamped {
                added: 1,
                quantity: 5
            }),
            Some(CLAMPED_NOTICE)
        );
        assert_eq!(
            notice_for(&AddOutcome::Unchanged { quantity: 5 }),
            Some(UNCHANGED_NOTICE)
        );
    }
}
