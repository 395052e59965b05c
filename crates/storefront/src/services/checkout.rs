//! Checkout: validate the buyer's details, then place the order.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use robo_shop_core::{PaymentMethod, PaymentMethodError, Principal, Wilaya, WilayaError};

use super::cart::{CartError, PricedCart, load_cart, price_cart, save_cart};
use crate::db::{
    CheckoutRepository, CheckoutWrite, NewCheckout, ProductRepository, RepositoryError, Shortage,
};
use crate::models::{Order, Payment};

/// Shown when a required checkout field is blank.
pub const MISSING_FIELDS_MESSAGE: &str = "الرجاء ملء كل الحقول المطلوبة";

/// Maximum length of the name fields, matching the `VARCHAR(100)` columns.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of the phone field, matching the `VARCHAR(30)` column.
pub const MAX_PHONE_LENGTH: usize = 30;

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required field is blank.
    #[error("required checkout fields are missing")]
    MissingFields,

    /// A field is longer than its column.
    #[error("checkout field {0} is too long")]
    FieldTooLong(&'static str),

    /// The state is not one of the wilayas.
    #[error(transparent)]
    UnknownState(#[from] WilayaError),

    /// The payment method is not blank and not a known code.
    #[error(transparent)]
    InvalidPaymentMethod(#[from] PaymentMethodError),

    /// There is nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// Stock changed since the items were added; the cart was reduced.
    #[error("stock changed for {} product(s)", .0.len())]
    StockChanged(Vec<Shortage>),

    /// The total exceeds what a payment can record.
    #[error("order total is too large")]
    AmountTooLarge,

    /// Cart/session failure.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Localized message to show on the re-rendered form, for errors the
    /// buyer can fix. `None` means the error is not the buyer's to fix.
    #[must_use]
    pub const fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::MissingFields => Some(MISSING_FIELDS_MESSAGE),
            Self::FieldTooLong(_) => Some("بعض الحقول أطول من المسموح"),
            Self::UnknownState(_) => Some("الرجاء اختيار ولاية صحيحة"),
            Self::InvalidPaymentMethod(_) => Some("طريقة الدفع غير صالحة"),
            Self::EmptyCart => Some("سلة المشتريات فارغة"),
            Self::StockChanged(_) => {
                Some("تغيّر المخزون المتوفر، تم تعديل الكميات في سلتك. راجع الطلب ثم أعد المحاولة")
            }
            Self::AmountTooLarge => Some("مبلغ الطلب كبير جدًا"),
            Self::Cart(_) | Self::Repository(_) => None,
        }
    }
}

/// Raw checkout form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct CheckoutInput {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub state: String,
    pub payment_method: String,
}

/// Checkout details that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub state: Wilaya,
    pub payment_method: Option<PaymentMethod>,
}

/// Validate the checkout form.
///
/// Blank required fields are reported first, as a single error.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_checkout(input: &CheckoutInput) -> Result<ValidCheckout, CheckoutError> {
    let first_name = input.first_name.trim();
    let last_name = input.last_name.trim();
    let phone = input.phone.trim();
    let state = input.state.trim();

    if first_name.is_empty() || last_name.is_empty() || phone.is_empty() || state.is_empty() {
        return Err(CheckoutError::MissingFields);
    }

    for (field, value, max) in [
        ("first_name", first_name, MAX_NAME_LENGTH),
        ("last_name", last_name, MAX_NAME_LENGTH),
        ("phone", phone, MAX_PHONE_LENGTH),
    ] {
        if value.chars().count() > max {
            return Err(CheckoutError::FieldTooLong(field));
        }
    }

    let state = Wilaya::parse(state)?;
    let payment_method = PaymentMethod::parse_optional(&input.payment_method)?;

    Ok(ValidCheckout {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        phone: phone.to_string(),
        state,
        payment_method,
    })
}

/// What a successful checkout recorded.
#[derive(Debug)]
pub struct CheckoutReceipt {
    pub payment: Payment,
    /// Recorded for logged-in buyers only.
    pub order: Option<Order>,
}

/// Checkout operations for one request.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    session: &'a Session,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service bound to the request's session.
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self { pool, session }
    }

    /// The priced cart shown next to the checkout form.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if a product in the cart has
    /// since been deleted.
    pub async fn summary(&self) -> Result<PricedCart, CheckoutError> {
        let cart = load_cart(self.session).await?;
        Ok(price_cart(&ProductRepository::new(self.pool), &cart).await?)
    }

    /// Validate the form and place the order.
    ///
    /// On a stock conflict nothing is recorded; the session cart is clamped
    /// to what is left and `CheckoutError::StockChanged` is returned.
    ///
    /// # Errors
    ///
    /// Returns a `CheckoutError`; see [`CheckoutError::user_message`] for the
    /// ones that should re-render the form.
    pub async fn submit(
        &self,
        principal: Option<Principal>,
        input: &CheckoutInput,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let details = validate_checkout(input)?;

        let mut cart = load_cart(self.session).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let write = CheckoutRepository::new(self.pool)
            .place(&NewCheckout {
                user_id: principal.map(|p| p.user_id),
                first_name: &details.first_name,
                last_name: &details.last_name,
                phone: &details.phone,
                state: details.state.name(),
                payment_method: details.payment_method,
                cart: &cart,
            })
            .await?;

        match write {
            CheckoutWrite::Placed { payment, order, .. } => {
                tracing::info!(
                    payment_id = %payment.id,
                    order_id = order.as_ref().map(|o| o.id.to_string()),
                    amount = %payment.amount,
                    "Checkout placed"
                );
                Ok(CheckoutReceipt { payment, order })
            }
            CheckoutWrite::Short(shortages) => {
                for shortage in &shortages {
                    cart.clamp_to_stock(shortage.product_id, shortage.available);
                }
                save_cart(self.session, &cart).await?;
                tracing::warn!(count = shortages.len(), "Checkout rejected: stock changed");
                Err(CheckoutError::StockChanged(shortages))
            }
            CheckoutWrite::AmountTooLarge => Err(CheckoutError::AmountTooLarge),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> CheckoutInput {
        CheckoutInput {
            first_name: " Amine ".to_string(),
            last_name: "Benali".to_string(),
            phone: "0550123456".to_string(),
            state: "Oran".to_string(),
            payment_method: "COD".to_string(),
        }
    }

    #[test]
    fn test_valid_checkout() {
        let valid = validate_checkout(&input()).unwrap();
        assert_eq!(valid.first_name, "Amine");
        assert_eq!(valid.state.name(), "Oran");
        assert_eq!(valid.payment_method, Some(PaymentMethod::CashOnDelivery));
    }

    #[test]
    fn test_blank_field_is_missing() {
        for blank in ["first_name", "last_name", "phone", "state"] {
            let mut form = input();
            match blank {
                "first_name" => form.first_name = "   ".to_string(),
                "last_name" => form.last_name = String::new(),
                "phone" => form.phone = " ".to_string(),
                _ => form.state = String::new(),
            }
            let err = validate_checkout(&form).unwrap_err();
            assert!(matches!(err, CheckoutError::MissingFields));
            assert_eq!(err.user_message(), Some(MISSING_FIELDS_MESSAGE));
        }
    }

    #[test]
    fn test_blank_payment_method_allowed() {
        let mut form = input();
        form.payment_method = String::new();
        assert_eq!(validate_checkout(&form).unwrap().payment_method, None);
    }

    #[test]
    fn test_unknown_payment_method() {
        let mut form = input();
        form.payment_method = "VISA".to_string();
        assert!(matches!(
            validate_checkout(&form),
            Err(CheckoutError::InvalidPaymentMethod(_))
        ));
    }

    #[test]
    fn test_unknown_state() {
        let mut form = input();
        form.state = "Atlantis".to_string();
        let err = validate_checkout(&form).unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownState(_)));
        assert!(err.user_message().is_some());
    }

    #[test]
    fn test_phone_too_long() {
        let mut form = input();
        form.phone = "0".repeat(31);
        assert!(matches!(
            validate_checkout(&form),
            Err(CheckoutError::FieldTooLong("phone"))
        ));
    }

    #[test]
    fn test_internal_errors_have_no_user_message() {
        let err = CheckoutError::Repository(RepositoryError::NotFound);
        assert_eq!(err.user_message(), None);
    }
}
