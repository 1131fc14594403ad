//! Product catalogue service

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{validate_name, validate_price, validate_stock_quantity, Principal, Product, Scope};
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::audit;

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, quantity, unit_price, image_url, supplier_id, created_at, is_deleted";

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product with its derived stock figures
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub total_stock_value: Decimal,
    pub is_available: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            total_stock_value: product.total_stock_value(),
            is_available: product.is_available(),
            product,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_price: Decimal,
    #[validate(url)]
    pub image_url: Option<String>,
    /// Owning supplier. Ignored for supplier accounts, which always own what they create.
    pub supplier_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive name search
    pub search: Option<String>,
    #[serde(default)]
    pub available_only: bool,
}

/// Lock a product row for the rest of the transaction
pub(crate) async fn lock_product(
    conn: &mut PgConnection,
    product_id: i64,
    include_deleted: bool,
) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE id = $1 AND ($2 OR is_deleted = FALSE)
        FOR UPDATE
        "#
    ))
    .bind(product_id)
    .bind(include_deleted)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Write a product's quantity back after a stock movement
pub(crate) async fn store_quantity(conn: &mut PgConnection, product: &Product) -> AppResult<()> {
    sqlx::query("UPDATE products SET quantity = $2 WHERE id = $1")
        .bind(product.id)
        .bind(product.quantity)
        .execute(conn)
        .await?;
    Ok(())
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Non-deleted products visible to the principal
    pub async fn list(&self, principal: &Principal, query: ProductQuery) -> AppResult<Vec<ProductView>> {
        let scope = principal.product_scope();
        let search = query.search.map(|s| format!("%{}%", s.trim()));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_deleted = FALSE
              AND ($1::VARCHAR IS NULL OR supplier_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
              AND (NOT $3 OR quantity > 0)
            ORDER BY name
            "#
        ))
        .bind(scope.supplier_filter())
        .bind(search)
        .bind(query.available_only)
        .fetch_all(&self.db)
        .await?;

        Ok(products.into_iter().map(ProductView::from).collect())
    }

    pub async fn get(&self, principal: &Principal, product_id: i64) -> AppResult<ProductView> {
        let product = self.fetch_visible(&principal.product_scope(), product_id).await?;
        Ok(product.into())
    }

    pub async fn create(&self, principal: &Principal, input: CreateProductInput) -> AppResult<ProductView> {
        input.validate()?;
        validate_name(&input.name).map_err(|m| AppError::invalid("name", m))?;
        validate_price(input.unit_price).map_err(|m| AppError::invalid("unit_price", m))?;

        let supplier_id = match principal.product_scope() {
            Scope::Supplier(own) => Some(own),
            _ => input.supplier_id,
        };

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, description, quantity, unit_price, image_url, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(&input.image_url)
        .bind(&supplier_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "name"))?;

        tracing::info!(product_id = product.id, name = %product.name, "Product created");

        Ok(product.into())
    }

    /// Edit catalogue fields. Setting `quantity` here is a stock count correction.
    pub async fn update(
        &self,
        principal: &Principal,
        product_id: i64,
        input: UpdateProductInput,
    ) -> AppResult<ProductView> {
        input.validate()?;
        if let Some(name) = &input.name {
            validate_name(name).map_err(|m| AppError::invalid("name", m))?;
        }
        if let Some(price) = input.unit_price {
            validate_price(price).map_err(|m| AppError::invalid("unit_price", m))?;
        }
        if let Some(quantity) = input.quantity {
            validate_stock_quantity(quantity).map_err(|m| AppError::invalid("quantity", m))?;
        }

        let mut tx = self.db.begin().await?;
        let current = lock_product(&mut tx, product_id, false).await?;
        if !principal.product_scope().admits(current.supplier_id.as_deref(), None) {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                quantity = COALESCE($4, quantity),
                unit_price = COALESCE($5, unit_price),
                image_url = COALESCE($6, image_url)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(&input.image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "name"))?;

        tx.commit().await?;

        if input.quantity.is_some_and(|q| q != current.quantity) {
            tracing::info!(
                product_id,
                from = current.quantity,
                to = product.quantity,
                "Stock count corrected"
            );
        }

        Ok(product.into())
    }

    /// Soft delete with a history snapshot
    pub async fn soft_delete(&self, principal: &Principal, product_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let product = lock_product(&mut tx, product_id, false).await?;
        if !principal.product_scope().admits(product.supplier_id.as_deref(), None) {
            return Err(AppError::NotFound("Product".to_string()));
        }

        audit::record_deletion(&mut tx, &product).await?;

        sqlx::query("UPDATE products SET is_deleted = TRUE WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(product_id, "Product deleted");
        Ok(())
    }

    pub async fn restore(&self, principal: &Principal, product_id: i64) -> AppResult<ProductView> {
        let mut tx = self.db.begin().await?;
        let mut product = lock_product(&mut tx, product_id, true).await?;
        if !principal.product_scope().admits(product.supplier_id.as_deref(), None) {
            return Err(AppError::NotFound("Product".to_string()));
        }
        if !product.is_deleted {
            return Err(AppError::InvalidStateTransition(
                "Product is not deleted".to_string(),
            ));
        }

        sqlx::query("UPDATE products SET is_deleted = FALSE WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        product.is_deleted = false;

        tracing::info!(product_id, "Product restored");
        Ok(product.into())
    }

    async fn fetch_visible(&self, scope: &Scope, product_id: i64) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .filter(|p| scope.admits(p.supplier_id.as_deref(), None))
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }
}
