//! Product catalog queries.
//!
//! Writes that change a seller's product are scoped by `seller_id` in SQL, so
//! a seller can never edit or delete another seller's product even if a
//! handler forgets to check ownership first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use robo_shop_core::{Price, ProductId, SellerId, Username};

use super::RepositoryError;
use crate::models::{Product, ProductDraft, ProductListing};

const PRODUCT_COLUMNS: &str =
    "p.id, p.seller_id, p.name, p.price, p.stock, p.description, p.image, p.created_at, p.updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub(crate) id: i32,
    seller_id: i32,
    pub(crate) name: String,
    pub(crate) price: Decimal,
    pub(crate) stock: i32,
    description: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    seller_username: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative stock for product {}: {}",
                row.id, row.stock
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            seller_id: SellerId::new(row.seller_id),
            name: row.name,
            price,
            stock,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ListingRow> for ProductListing {
    type Error = RepositoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let seller_username = Username::parse(&row.seller_username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        Ok(Self {
            product: Product::try_from(row.product)?,
            seller_username,
        })
    }
}

/// Convert a stock count for binding to an `INTEGER` column.
fn stock_param(stock: u32) -> Result<i32, RepositoryError> {
    i32::try_from(stock).map_err(|_| RepositoryError::Conflict(format!("stock {stock} is too large")))
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products with their seller's username, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ProductListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}, u.username AS seller_username
            FROM shop.product p
            JOIN shop.seller s ON s.id = p.seller_id
            JOIN shop.user u ON u.id = s.user_id
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ProductListing::try_from).collect()
    }

    /// A single product with its seller's username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_listing(&self, id: ProductId) -> Result<Option<ProductListing>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}, u.username AS seller_username
            FROM shop.product p
            JOIN shop.seller s ON s.id = p.seller_id
            JOIN shop.user u ON u.id = s.user_id
            WHERE p.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProductListing::try_from).transpose()
    }

    /// Products owned by one seller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller(&self, seller_id: SellerId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            WHERE p.seller_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get several products by ID. Missing IDs are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p WHERE p.id = ANY($1) ORDER BY p.id"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create a product for a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        seller_id: SellerId,
        draft: &ProductDraft,
        image: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.product AS p (seller_id, name, price, stock, description, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING p.id, p.seller_id, p.name, p.price, p.stock, p.description, p.image,
                      p.created_at, p.updated_at
            ",
        )
        .bind(seller_id)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(stock_param(draft.stock)?)
        .bind(&draft.description)
        .bind(image)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Update a product owned by `seller_id`.
    ///
    /// `image` of `None` keeps the current image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product with this ID belongs
    /// to the seller.
    pub async fn update_owned(
        &self,
        id: ProductId,
        seller_id: SellerId,
        draft: &ProductDraft,
        image: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.product AS p
            SET name = $3, price = $4, stock = $5, description = $6,
                image = COALESCE($7, p.image), updated_at = NOW()
            WHERE p.id = $1 AND p.seller_id = $2
            RETURNING p.id, p.seller_id, p.name, p.price, p.stock, p.description, p.image,
                      p.created_at, p.updated_at
            ",
        )
        .bind(id)
        .bind(seller_id)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(stock_param(draft.stock)?)
        .bind(&draft.description)
        .bind(image)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product owned by `seller_id`. Returns the removed image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product with this ID belongs
    /// to the seller.
    pub async fn delete_owned(
        &self,
        id: ProductId,
        seller_id: SellerId,
    ) -> Result<Option<String>, RepositoryError> {
        let (image,): (Option<String>,) = sqlx::query_as(
            "DELETE FROM shop.product WHERE id = $1 AND seller_id = $2 RETURNING image",
        )
        .bind(id)
        .bind(seller_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(image)
    }

    /// Lock products for the rest of a transaction and return them.
    ///
    /// Rows are locked in ID order so concurrent checkouts cannot deadlock.
    pub(crate) async fn lock_for_update(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<ProductRow>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product p
            WHERE p.id = ANY($1)
            ORDER BY p.id
            FOR UPDATE
            "
        ))
        .bind(raw)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Subtract sold units from a product's stock.
    ///
    /// The `stock >= $2` guard makes this a no-op rather than driving stock
    /// negative; the caller treats zero affected rows as a stock conflict.
    pub(crate) async fn decrement_stock(
        conn: &mut PgConnection,
        id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(id)
        .bind(stock_param(quantity)?)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "insufficient stock for product {id}"
            )));
        }
        Ok(())
    }
}
