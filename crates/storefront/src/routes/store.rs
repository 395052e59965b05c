//! Catalog and seller product management.
//!
//! Every page here requires a login. Product writes are multipart forms with
//! an optional image; ownership is checked here and again in SQL.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use robo_shop_core::{Capability, ProductId, SellerId};

use super::Nav;
use crate::db::{ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, RequireSeller};
use crate::models::{CurrentUser, Product, ProductDraft, ProductErrors, ProductInput, ProductListing};
use crate::services::media::MediaError;
use crate::state::AppState;

/// Body of the 403 for non-sellers on the add-product page.
pub const ONLY_SELLERS_MESSAGE: &str = "Only sellers can add products.";

/// Body of the 403 for someone else's product.
pub const NOT_OWNER_MESSAGE: &str = "You can only change your own products.";

const DASHBOARD_PATH: &str = "/store/dashboard/";
const PRODUCT_LIST_PATH: &str = "/store/products/";

// =============================================================================
// Multipart Form
// =============================================================================

/// An uploaded file.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Product form fields plus the optional image.
#[derive(Debug, Default)]
pub struct ProductSubmission {
    pub input: ProductInput,
    pub image: Option<Upload>,
}

/// Read the product form. A file field with no name or no content means "no image".
async fn read_product_form(mut multipart: Multipart) -> Result<ProductSubmission, AppError> {
    let mut submission = ProductSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("invalid image upload: {e}")))?;
            if !file_name.is_empty() && !bytes.is_empty() {
                submission.image = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid form field {name}: {e}")))?;
        match name.as_str() {
            "name" => submission.input.name = value,
            "price" => submission.input.price = value,
            "stock" => submission.input.stock = value,
            "description" => submission.input.description = value,
            _ => {}
        }
    }

    Ok(submission)
}

/// Outcome of validating a submission and storing its image.
enum Prepared {
    Ready {
        draft: ProductDraft,
        image: Option<String>,
    },
    Invalid {
        errors: ProductErrors,
        image_error: Option<&'static str>,
    },
}

/// Validate the fields, then store the image only when everything is valid.
async fn prepare(state: &AppState, submission: &ProductSubmission) -> Result<Prepared, AppError> {
    let draft = match ProductDraft::validate(&submission.input) {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(Prepared::Invalid {
                errors,
                image_error: None,
            });
        }
    };

    let image = match &submission.image {
        Some(upload) => match state
            .media()
            .save_product_image(&upload.file_name, &upload.bytes)
            .await
        {
            Ok(path) => Some(path),
            Err(e @ (MediaError::UnsupportedType(_) | MediaError::TooLarge(_))) => {
                return Ok(Prepared::Invalid {
                    errors: ProductErrors::default(),
                    image_error: Some(e.user_message()),
                });
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    Ok(Prepared::Ready { draft, image })
}

/// Create a product; the stored image is removed again if the insert fails.
async fn create_product(
    state: &AppState,
    seller_id: SellerId,
    draft: &ProductDraft,
    image: Option<String>,
) -> Result<Product, AppError> {
    match ProductRepository::new(state.pool())
        .create(seller_id, draft, image.as_deref())
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, seller_id = %seller_id, "Product created");
            Ok(product)
        }
        Err(e) => {
            if let Some(path) = image {
                state.media().remove(&path).await;
            }
            Err(e.into())
        }
    }
}

/// Load a product and check the user may change it.
async fn owned_product(
    state: &AppState,
    user: &CurrentUser,
    id: ProductId,
) -> Result<(Product, SellerId), AppError> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let principal = user.principal();
    match principal.seller_id {
        Some(seller_id) if principal.owns(product.seller_id) => Ok((product, seller_id)),
        _ => Err(AppError::Forbidden(NOT_OWNER_MESSAGE.to_string())),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Form values re-rendered after a failed submission.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub name: String,
    pub price: String,
    pub stock: String,
    pub description: String,
}

impl From<&ProductInput> for ProductFormView {
    fn from(input: &ProductInput) -> Self {
        Self {
            name: input.name.clone(),
            price: input.price.clone(),
            stock: input.stock.clone(),
            description: input.description.clone(),
        }
    }
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.form_value(),
            stock: product.stock.to_string(),
            description: product.description.clone(),
        }
    }
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "store/product_list.html")]
pub struct ProductListTemplate {
    pub nav: Nav,
    pub listings: Vec<ProductListing>,
    pub can_buy: bool,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "store/product_detail.html")]
pub struct ProductDetailTemplate {
    pub nav: Nav,
    pub listing: ProductListing,
    pub can_buy: bool,
    pub is_owner: bool,
}

/// Seller dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "store/seller_dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub products: Vec<Product>,
    pub form: ProductFormView,
    pub errors: ProductErrors,
    pub image_error: Option<&'static str>,
}

/// Add product template.
#[derive(Template, WebTemplate)]
#[template(path = "store/add_product.html")]
pub struct AddProductTemplate {
    pub nav: Nav,
    pub form: ProductFormView,
    pub errors: ProductErrors,
    pub image_error: Option<&'static str>,
}

/// Edit product template.
#[derive(Template, WebTemplate)]
#[template(path = "store/edit_product.html")]
pub struct EditProductTemplate {
    pub nav: Nav,
    pub product: Product,
    pub form: ProductFormView,
    pub errors: ProductErrors,
    pub image_error: Option<&'static str>,
}

// =============================================================================
// Catalog
// =============================================================================

/// List all products, newest first.
#[instrument(skip(state, user))]
pub async fn product_list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ProductListTemplate, AppError> {
    let listings = ProductRepository::new(state.pool()).list_all().await?;

    Ok(ProductListTemplate {
        nav: Nav::for_user(Some(&user)),
        listings,
        can_buy: user.principal().can(Capability::UseCart),
    })
}

/// Show one product.
#[instrument(skip(state, user))]
pub async fn product_detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<ProductDetailTemplate, AppError> {
    let listing = ProductRepository::new(state.pool())
        .get_listing(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let principal = user.principal();
    Ok(ProductDetailTemplate {
        nav: Nav::for_user(Some(&user)),
        can_buy: principal.can(Capability::UseCart),
        is_owner: principal.owns(listing.product.seller_id),
        listing,
    })
}

// =============================================================================
// Seller Dashboard
// =============================================================================

async fn render_dashboard(
    state: &AppState,
    user: &CurrentUser,
    seller_id: SellerId,
    form: ProductFormView,
    errors: ProductErrors,
    image_error: Option<&'static str>,
) -> Result<DashboardTemplate, AppError> {
    let products = ProductRepository::new(state.pool())
        .list_by_seller(seller_id)
        .await?;

    Ok(DashboardTemplate {
        nav: Nav::for_user(Some(user)),
        products,
        form,
        errors,
        image_error,
    })
}

/// Show the seller's products and the inline add form.
#[instrument(skip(state, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireSeller(user, seller_id): RequireSeller,
) -> Result<DashboardTemplate, AppError> {
    render_dashboard(
        &state,
        &user,
        seller_id,
        ProductFormView::default(),
        ProductErrors::default(),
        None,
    )
    .await
}

/// Create a product from the dashboard form.
#[instrument(skip(state, user, multipart))]
pub async fn dashboard_create(
    State(state): State<AppState>,
    RequireSeller(user, seller_id): RequireSeller,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_product_form(multipart).await?;

    match prepare(&state, &submission).await? {
        Prepared::Ready { draft, image } => {
            create_product(&state, seller_id, &draft, image).await?;
            Ok(Redirect::to(DASHBOARD_PATH).into_response())
        }
        Prepared::Invalid {
            errors,
            image_error,
        } => Ok(render_dashboard(
            &state,
            &user,
            seller_id,
            ProductFormView::from(&submission.input),
            errors,
            image_error,
        )
        .await?
        .into_response()),
    }
}

// =============================================================================
// Add / Edit / Delete
// =============================================================================

fn require_seller_id(user: &CurrentUser) -> Result<SellerId, AppError> {
    user.seller_id
        .filter(|_| user.principal().can(Capability::ManageProducts))
        .ok_or_else(|| AppError::Forbidden(ONLY_SELLERS_MESSAGE.to_string()))
}

/// Display the add product page.
pub async fn add_product_page(
    RequireAuth(user): RequireAuth,
) -> Result<AddProductTemplate, AppError> {
    require_seller_id(&user)?;

    Ok(AddProductTemplate {
        nav: Nav::for_user(Some(&user)),
        form: ProductFormView::default(),
        errors: ProductErrors::default(),
        image_error: None,
    })
}

/// Handle the add product form.
#[instrument(skip(state, user, multipart))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let seller_id = require_seller_id(&user)?;
    let submission = read_product_form(multipart).await?;

    match prepare(&state, &submission).await? {
        Prepared::Ready { draft, image } => {
            create_product(&state, seller_id, &draft, image).await?;
            Ok(Redirect::to(PRODUCT_LIST_PATH).into_response())
        }
        Prepared::Invalid {
            errors,
            image_error,
        } => Ok(AddProductTemplate {
            nav: Nav::for_user(Some(&user)),
            form: ProductFormView::from(&submission.input),
            errors,
            image_error,
        }
        .into_response()),
    }
}

/// Display the edit form for one of the seller's products.
#[instrument(skip(state, user))]
pub async fn edit_product_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<EditProductTemplate, AppError> {
    let (product, _) = owned_product(&state, &user, id).await?;

    Ok(EditProductTemplate {
        nav: Nav::for_user(Some(&user)),
        form: ProductFormView::from(&product),
        product,
        errors: ProductErrors::default(),
        image_error: None,
    })
}

/// Save changes to one of the seller's products.
///
/// A new image replaces the old one, which is then deleted from disk.
#[instrument(skip(state, user, multipart))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (product, seller_id) = owned_product(&state, &user, id).await?;
    let submission = read_product_form(multipart).await?;

    let (draft, image) = match prepare(&state, &submission).await? {
        Prepared::Ready { draft, image } => (draft, image),
        Prepared::Invalid {
            errors,
            image_error,
        } => {
            return Ok(EditProductTemplate {
                nav: Nav::for_user(Some(&user)),
                form: ProductFormView::from(&submission.input),
                product,
                errors,
                image_error,
            }
            .into_response());
        }
    };

    let updated = ProductRepository::new(state.pool())
        .update_owned(id, seller_id, &draft, image.as_deref())
        .await;

    match updated {
        Ok(_) => {
            if let (Some(_), Some(old)) = (&image, &product.image) {
                state.media().remove(old).await;
            }
            tracing::info!(product_id = %id, "Product updated");
            Ok(Redirect::to(DASHBOARD_PATH).into_response())
        }
        Err(e) => {
            if let Some(path) = image {
                state.media().remove(&path).await;
            }
            Err(match e {
                RepositoryError::NotFound => AppError::Forbidden(NOT_OWNER_MESSAGE.to_string()),
                other => other.into(),
            })
        }
    }
}

/// Delete one of the seller's products and its image.
#[instrument(skip(state, user))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let (_, seller_id) = owned_product(&state, &user, id).await?;

    let image = ProductRepository::new(state.pool())
        .delete_owned(id, seller_id)
        .await?;
    if let Some(path) = image {
        state.media().remove(&path).await;
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Redirect::to(DASHBOARD_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use robo_shop_core::{UserId, Username};

    use super::*;

    fn user(seller_id: Option<SellerId>) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            username: Username::parse("someone").unwrap(),
            seller_id,
        }
    }

    #[test]
    fn test_only_sellers_may_add() {
        assert_eq!(
            require_seller_id(&user(Some(SellerId::new(4)))).unwrap(),
            SellerId::new(4)
        );
        let err = require_seller_id(&user(None)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg == ONLY_SELLERS_MESSAGE));
    }

    #[test]
    fn test_form_view_from_input_keeps_raw_values() {
        let input = ProductInput {
            name: "Servo".to_string(),
            price: "abc".to_string(),
            stock: "-1".to_string(),
            description: String::new(),
        };
        let view = ProductFormView::from(&input);
        assert_eq!(view.price, "abc");
        assert_eq!(view.stock, "-1");
    }
}
