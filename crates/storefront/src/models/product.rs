//! Product domain types and product form validation.

use chrono::{DateTime, Utc};

use robo_shop_core::{Price, ProductId, SellerId, Username};

/// Maximum product name length, matching the `VARCHAR(100)` column.
pub const MAX_NAME_LENGTH: usize = 100;

/// A catalog product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub description: String,
    /// Path relative to the media root, e.g. `products/3f2c….png`.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// URL of the product image under `/media`, if it has one.
    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| format!("/media/{path}"))
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product together with its seller's username, for the catalog pages.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product: Product,
    pub seller_username: Username,
}

/// Raw product form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: String,
    pub price: String,
    pub stock: String,
    pub description: String,
}

/// Per-field validation messages for the product form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductErrors {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
}

impl ProductErrors {
    /// Whether no field failed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

/// A validated product, ready to insert or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub description: String,
}

impl ProductDraft {
    /// Validate submitted product fields.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any field is invalid.
    pub fn validate(input: &ProductInput) -> Result<Self, ProductErrors> {
        let mut errors = ProductErrors::default();

        let name = input.name.trim();
        if name.is_empty() {
            errors.name = Some("This field is required.".to_string());
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.name = Some(format!(
                "Ensure this value has at most {MAX_NAME_LENGTH} characters."
            ));
        }

        let price = match Price::parse(&input.price) {
            Ok(price) => Some(price),
            Err(e) => {
                errors.price = Some(e.to_string());
                None
            }
        };

        let stock = match parse_stock(&input.stock) {
            Ok(stock) => Some(stock),
            Err(message) => {
                errors.stock = Some(message);
                None
            }
        };

        match (price, stock) {
            (Some(price), Some(stock)) if errors.is_empty() => Ok(Self {
                name: name.to_string(),
                price,
                stock,
                description: input.description.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Parse a stock count: a whole number between 0 and `i32::MAX`.
fn parse_stock(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("This field is required.".to_string());
    }
    let value: i64 = raw
        .parse()
        .map_err(|_| "Enter a whole number.".to_string())?;
    if value < 0 {
        return Err("Stock cannot be negative.".to_string());
    }
    if value > i64::from(i32::MAX) {
        return Err("Stock is too large.".to_string());
    }
    u32::try_from(value).map_err(|_| "Stock is too large.".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, price: &str, stock: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price: price.to_string(),
            stock: stock.to_string(),
            description: "  Six-axis arm  ".to_string(),
        }
    }

    #[test]
    fn test_valid_draft() {
        let draft = ProductDraft::validate(&input(" Robot Arm ", "1500.5", "3")).unwrap();
        assert_eq!(draft.name, "Robot Arm");
        assert_eq!(draft.price.form_value(), "1500.50");
        assert_eq!(draft.stock, 3);
        assert_eq!(draft.description, "Six-axis arm");
    }

    #[test]
    fn test_name_required() {
        let errors = ProductDraft::validate(&input("   ", "10", "1")).unwrap_err();
        assert!(errors.name.is_some());
        assert!(errors.price.is_none());
    }

    #[test]
    fn test_name_too_long() {
        let errors = ProductDraft::validate(&input(&"x".repeat(101), "10", "1")).unwrap_err();
        assert!(errors.name.is_some());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let errors = ProductDraft::validate(&input("Servo", "10", "-1")).unwrap_err();
        assert_eq!(errors.stock.as_deref(), Some("Stock cannot be negative."));
    }

    #[test]
    fn test_bad_price_and_stock_reported_together() {
        let errors = ProductDraft::validate(&input("Servo", "cheap", "many")).unwrap_err();
        assert!(errors.price.is_some());
        assert!(errors.stock.is_some());
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_image_url() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(1),
            seller_id: SellerId::new(1),
            name: "Gripper".to_string(),
            price: Price::ZERO,
            stock: 0,
            description: String::new(),
            image: Some("products/a.png".to_string()),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(product.image_url().as_deref(), Some("/media/products/a.png"));
        assert!(!product.in_stock());
    }
}
