//! Supplier directory and product/supplier links

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    slugify, sort_for_contact, validate_email, validate_name, validate_password_confirmation,
    validate_phone, validate_price, validate_supplier_code, Principal, Supplier, SupplierLink,
    DEFAULT_LEAD_TIME_DAYS, DEFAULT_MIN_ORDER_QUANTITY,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;

const SUPPLIER_COLUMNS: &str =
    "id, user_id, name, email, phone, address, is_active, created_at";

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Supplier code; derived from the name when omitted
    pub code: Option<String>,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Creates a dashboard login (username = supplier code) when present
    pub dashboard_password: Option<String>,
    pub dashboard_password_confirmation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordInput {
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkInput {
    pub supplier_id: String,
    pub supplier_price: Decimal,
    pub lead_time_days: Option<i32>,
    pub min_order_quantity: Option<i32>,
    #[serde(default)]
    pub is_principal: bool,
}

/// A product/supplier link with the supplier's display fields
#[derive(Debug, Serialize, FromRow)]
pub struct SupplierLinkView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub link: SupplierLink,
    pub supplier_name: String,
    pub supplier_is_active: bool,
}

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: SupplierQuery) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            SELECT {SUPPLIER_COLUMNS}
            FROM suppliers
            WHERE ($1 OR is_active = TRUE)
            ORDER BY name
            "#
        ))
        .bind(query.include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, supplier_id: &str) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
        ))
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// The supplier record linked to the calling account
    pub async fn my_supplier(&self, principal: &Principal) -> AppResult<Supplier> {
        match &principal.supplier_id {
            Some(id) => self.get(id).await,
            None => Err(AppError::NotFound("Supplier".to_string())),
        }
    }

    pub async fn create(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        input.validate()?;
        validate_name(&input.name).map_err(|m| AppError::invalid("name", m))?;
        validate_email(&input.email).map_err(|m| AppError::invalid("email", m))?;
        if let Some(phone) = &input.phone {
            validate_phone(phone).map_err(|m| AppError::invalid("phone", m))?;
        }

        let code = match &input.code {
            Some(code) => code.trim().to_string(),
            None => slugify(&input.name),
        };
        validate_supplier_code(&code).map_err(|m| AppError::invalid("code", m))?;

        let mut tx = self.db.begin().await?;

        let user_id = match &input.dashboard_password {
            Some(password) => {
                let confirmation = input
                    .dashboard_password_confirmation
                    .as_deref()
                    .unwrap_or_default();
                validate_password_confirmation(password, confirmation)
                    .map_err(|m| AppError::invalid("dashboard_password", m))?;
                Some(create_dashboard_user(&mut tx, &code, &input.email, password).await?)
            }
            None => None,
        };

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (id, user_id, name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(&code)
        .bind(user_id)
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&mut *tx)
        .await
        .map_err(supplier_conflict)?;

        tx.commit().await?;

        tracing::info!(supplier_id = %supplier.id, dashboard = user_id.is_some(), "Supplier created");
        Ok(supplier)
    }

    pub async fn update(&self, supplier_id: &str, input: UpdateSupplierInput) -> AppResult<Supplier> {
        input.validate()?;
        if let Some(name) = &input.name {
            validate_name(name).map_err(|m| AppError::invalid("name", m))?;
        }
        if let Some(phone) = &input.phone {
            validate_phone(phone).map_err(|m| AppError::invalid("phone", m))?;
        }

        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address)
            WHERE id = $1
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(supplier_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_optional(&self.db)
        .await
        .map_err(supplier_conflict)?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// Suppliers are deactivated rather than deleted. Inactive suppliers are
    /// skipped when contacting about stock outs and cannot sign in.
    pub async fn set_active(&self, supplier_id: &str, active: bool) -> AppResult<Supplier> {
        let mut tx = self.db.begin().await?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "UPDATE suppliers SET is_active = $2 WHERE id = $1 RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(supplier_id)
        .bind(active)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        if let Some(user_id) = supplier.user_id {
            sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
                .bind(user_id)
                .bind(active)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(supplier_id, active, "Supplier activation changed");
        Ok(supplier)
    }

    /// Set or reset the supplier's dashboard password
    pub async fn set_password(&self, supplier_id: &str, input: SetPasswordInput) -> AppResult<()> {
        validate_password_confirmation(&input.password, &input.password_confirmation)
            .map_err(|m| AppError::invalid("password", m))?;

        let mut tx = self.db.begin().await?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 FOR UPDATE"
        ))
        .bind(supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        match supplier.user_id {
            Some(user_id) => {
                let password_hash = hash_password(&input.password)?;
                sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
                    .bind(user_id)
                    .bind(password_hash)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                let user_id =
                    create_dashboard_user(&mut tx, &supplier.id, &supplier.email, &input.password)
                        .await?;
                sqlx::query("UPDATE suppliers SET user_id = $2 WHERE id = $1")
                    .bind(&supplier.id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(supplier_id, "Supplier dashboard password set");
        Ok(())
    }

    // ========================================================================
    // Product Links
    // ========================================================================

    /// Suppliers of a product in contact order
    pub async fn list_links(&self, principal: &Principal, product_id: i64) -> AppResult<Vec<SupplierLinkView>> {
        self.ensure_product_visible(principal, product_id).await?;

        let mut links = sqlx::query_as::<_, SupplierLinkView>(
            r#"
            SELECT l.id, l.product_id, l.supplier_id, l.supplier_price, l.lead_time_days,
                   l.min_order_quantity, l.is_principal, l.created_at,
                   s.name AS supplier_name, s.is_active AS supplier_is_active
            FROM product_suppliers l
            JOIN suppliers s ON s.id = l.supplier_id
            WHERE l.product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        sort_for_contact(&mut links, |l| &l.link);
        Ok(links)
    }

    pub async fn add_link(
        &self,
        principal: &Principal,
        product_id: i64,
        input: CreateLinkInput,
    ) -> AppResult<SupplierLink> {
        self.ensure_product_visible(principal, product_id).await?;
        if principal.is_supplier() && principal.supplier_id.as_deref() != Some(input.supplier_id.as_str()) {
            return Err(AppError::InsufficientPermissions);
        }

        validate_price(input.supplier_price).map_err(|m| AppError::invalid("supplier_price", m))?;
        let lead_time_days = input.lead_time_days.unwrap_or(DEFAULT_LEAD_TIME_DAYS);
        let min_order_quantity = input.min_order_quantity.unwrap_or(DEFAULT_MIN_ORDER_QUANTITY);
        if lead_time_days < 0 {
            return Err(AppError::invalid("lead_time_days", "Lead time cannot be negative"));
        }
        if min_order_quantity < 1 {
            return Err(AppError::invalid(
                "min_order_quantity",
                "Minimum order quantity must be at least 1",
            ));
        }

        // Surface an unknown supplier as 404 rather than a foreign key error
        self.get(&input.supplier_id).await?;

        let link = sqlx::query_as::<_, SupplierLink>(
            r#"
            INSERT INTO product_suppliers
                (product_id, supplier_id, supplier_price, lead_time_days, min_order_quantity, is_principal)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, product_id, supplier_id, supplier_price, lead_time_days,
                      min_order_quantity, is_principal, created_at
            "#,
        )
        .bind(product_id)
        .bind(&input.supplier_id)
        .bind(input.supplier_price)
        .bind(lead_time_days)
        .bind(min_order_quantity)
        .bind(input.is_principal)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "supplier_id"))?;

        tracing::info!(product_id, supplier_id = %link.supplier_id, "Supplier linked to product");
        Ok(link)
    }

    pub async fn remove_link(&self, principal: &Principal, product_id: i64, supplier_id: &str) -> AppResult<()> {
        self.ensure_product_visible(principal, product_id).await?;
        if principal.is_supplier() && principal.supplier_id.as_deref() != Some(supplier_id) {
            return Err(AppError::InsufficientPermissions);
        }

        let result = sqlx::query("DELETE FROM product_suppliers WHERE product_id = $1 AND supplier_id = $2")
            .bind(product_id)
            .bind(supplier_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product supplier link".to_string()));
        }
        Ok(())
    }

    async fn ensure_product_visible(&self, principal: &Principal, product_id: i64) -> AppResult<()> {
        let owner = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT supplier_id FROM products WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if principal.product_scope().admits(owner.0.as_deref(), None) {
            Ok(())
        } else {
            Err(AppError::NotFound("Product".to_string()))
        }
    }
}

/// Input field behind a unique constraint of the `suppliers` table
fn conflicting_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("suppliers_pkey") => "code",
        Some("suppliers_user_id_key") => "user_id",
        _ => "name",
    }
}

fn supplier_conflict(err: sqlx::Error) -> AppError {
    let field = match &err {
        sqlx::Error::Database(db) => conflicting_field(db.constraint()),
        _ => "name",
    };
    AppError::from_unique_violation(err, field)
}

/// Create the login account for a supplier dashboard
async fn create_dashboard_user(
    conn: &mut PgConnection,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<Uuid> {
    let password_hash = hash_password(password)?;

    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "username"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_collision_reports_code() {
        assert_eq!(conflicting_field(Some("suppliers_pkey")), "code");
    }

    #[test]
    fn test_name_collision_reports_name() {
        assert_eq!(conflicting_field(Some("suppliers_name_key")), "name");
        assert_eq!(conflicting_field(None), "name");
    }
}
