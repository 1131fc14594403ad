//! Invoice service
//!
//! Viewing follows the same scope as orders. Changing an invoice's status or
//! deleting it additionally requires an administrator or stock manager; a
//! supplier may only move its own invoices to `paid`.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{Invoice, InvoiceStatus, Principal, Resource};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::order::lock_order;
use crate::services::{audit, NotificationService};

const INVOICE_COLUMNS: &str = "i.id, i.order_id, i.total_amount, i.amount_paid, i.status, \
     i.agent_id, i.created_at, i.updated_at, i.is_deleted";

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    notifications: NotificationService,
}

#[derive(Debug, Clone, FromRow)]
struct InvoiceRow {
    #[sqlx(flatten)]
    invoice: Invoice,
    product_name: Option<String>,
    product_supplier_id: Option<String>,
}

/// Invoice as returned by the API
#[derive(Debug, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub product_name: Option<String>,
    pub remaining_balance: Decimal,
}

impl From<InvoiceRow> for InvoiceView {
    fn from(row: InvoiceRow) -> Self {
        Self {
            remaining_balance: row.invoice.remaining_balance(),
            invoice: row.invoice,
            product_name: row.product_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceInput {
    pub order_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentInput {
    pub amount: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    /// List deleted invoices instead of live ones
    #[serde(default)]
    pub deleted: bool,
}

async fn lock_invoice(conn: &mut PgConnection, invoice_id: i64, deleted: bool) -> AppResult<InvoiceRow> {
    sqlx::query_as::<_, InvoiceRow>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}, p.name AS product_name, p.supplier_id AS product_supplier_id
        FROM invoices i
        LEFT JOIN orders o ON o.id = i.order_id
        LEFT JOIN products p ON p.id = o.product_id
        WHERE i.id = $1 AND i.is_deleted = $2
        FOR UPDATE OF i
        "#
    ))
    .bind(invoice_id)
    .bind(deleted)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}

fn ensure_visible(principal: &Principal, row: &InvoiceRow) -> AppResult<()> {
    if principal
        .record_scope(Resource::Invoice)
        .admits(row.product_supplier_id.as_deref(), row.invoice.agent_id)
    {
        Ok(())
    } else {
        Err(AppError::NotFound("Invoice".to_string()))
    }
}

fn ensure_manager(principal: &Principal) -> AppResult<()> {
    if principal.may_manage_invoices() {
        Ok(())
    } else {
        tracing::warn!(user_id = %principal.user_id, role = ?principal.role(), "Invoice management denied");
        Err(AppError::InsufficientPermissions)
    }
}

impl InvoiceService {
    pub fn new(db: PgPool, notifications: NotificationService) -> Self {
        Self { db, notifications }
    }

    /// Issue the invoice for an order, capturing its current amount
    pub async fn create(&self, principal: &Principal, input: CreateInvoiceInput) -> AppResult<InvoiceView> {
        let mut tx = self.db.begin().await?;

        let order = lock_order(&mut tx, input.order_id, false).await?;
        if !principal
            .record_scope(Resource::Order)
            .admits(order.product_supplier_id.as_deref(), order.order.agent_id)
        {
            return Err(AppError::NotFound("Order".to_string()));
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (order_id, total_amount, agent_id)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, total_amount, amount_paid, status, agent_id,
                      created_at, updated_at, is_deleted
            "#,
        )
        .bind(order.order.id)
        .bind(order.order.amount())
        .bind(principal.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "order_id"))?;

        tx.commit().await?;

        tracing::info!(invoice_id = invoice.id, order_id = order.order.id, total = %invoice.total_amount, "Invoice created");

        Ok(InvoiceRow {
            invoice,
            product_name: Some(order.product_name),
            product_supplier_id: order.product_supplier_id,
        }
        .into())
    }

    pub async fn get(&self, principal: &Principal, invoice_id: i64) -> AppResult<InvoiceView> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}, p.name AS product_name, p.supplier_id AS product_supplier_id
            FROM invoices i
            LEFT JOIN orders o ON o.id = i.order_id
            LEFT JOIN products p ON p.id = o.product_id
            WHERE i.id = $1 AND i.is_deleted = FALSE
            "#
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        ensure_visible(principal, &row)?;
        Ok(row.into())
    }

    pub async fn list(&self, principal: &Principal, query: InvoiceQuery) -> AppResult<Vec<InvoiceView>> {
        let scope = principal.record_scope(Resource::Invoice);

        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}, p.name AS product_name, p.supplier_id AS product_supplier_id
            FROM invoices i
            LEFT JOIN orders o ON o.id = i.order_id
            LEFT JOIN products p ON p.id = o.product_id
            WHERE i.is_deleted = $1
              AND ($2::VARCHAR IS NULL OR p.supplier_id = $2)
              AND ($3::UUID IS NULL OR i.agent_id = $3)
              AND ($4::invoice_status IS NULL OR i.status = $4)
            ORDER BY i.created_at DESC, i.id DESC
            "#
        ))
        .bind(query.deleted)
        .bind(scope.supplier_filter())
        .bind(scope.agent_filter())
        .bind(query.status)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(InvoiceView::from).collect())
    }

    /// Move an invoice through draft → validated → paid, or cancel it
    pub async fn update_status(
        &self,
        principal: &Principal,
        invoice_id: i64,
        input: UpdateStatusInput,
    ) -> AppResult<InvoiceView> {
        if !principal.may_set_invoice_status(input.status) {
            tracing::warn!(
                user_id = %principal.user_id,
                role = ?principal.role(),
                status = input.status.as_str(),
                "Invoice status change denied"
            );
            return Err(AppError::InsufficientPermissions);
        }

        let mut tx = self.db.begin().await?;
        let mut row = lock_invoice(&mut tx, invoice_id, false).await?;
        ensure_visible(principal, &row)?;

        let previous = row.invoice.status;
        row.invoice.transition(input.status)?;
        row.invoice.updated_at = Utc::now();
        self.store(&mut tx, &row.invoice).await?;

        tx.commit().await?;

        tracing::info!(
            invoice_id,
            from = previous.as_str(),
            to = row.invoice.status.as_str(),
            "Invoice status changed"
        );

        if row.invoice.status == InvoiceStatus::Paid {
            self.notify_paid(&row.invoice).await;
        }

        Ok(row.into())
    }

    /// Record a payment on a validated invoice. Settling the balance marks it paid.
    pub async fn record_payment(
        &self,
        principal: &Principal,
        invoice_id: i64,
        input: RecordPaymentInput,
    ) -> AppResult<InvoiceView> {
        let mut tx = self.db.begin().await?;
        let mut row = lock_invoice(&mut tx, invoice_id, false).await?;
        ensure_visible(principal, &row)?;

        let settled = row.invoice.record_payment(input.amount)?;
        row.invoice.updated_at = Utc::now();
        self.store(&mut tx, &row.invoice).await?;

        tx.commit().await?;

        tracing::info!(
            invoice_id,
            amount = %input.amount,
            remaining = %row.invoice.remaining_balance(),
            "Invoice payment recorded"
        );

        if settled {
            self.notify_paid(&row.invoice).await;
        }

        Ok(row.into())
    }

    pub async fn soft_delete(&self, principal: &Principal, invoice_id: i64) -> AppResult<()> {
        ensure_manager(principal)?;

        let mut tx = self.db.begin().await?;
        let row = lock_invoice(&mut tx, invoice_id, false).await?;
        ensure_visible(principal, &row)?;

        audit::record_deletion(&mut tx, &row.invoice).await?;

        sqlx::query("UPDATE invoices SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(invoice_id, "Invoice deleted");
        Ok(())
    }

    pub async fn restore(&self, principal: &Principal, invoice_id: i64) -> AppResult<InvoiceView> {
        ensure_manager(principal)?;

        let mut tx = self.db.begin().await?;
        let mut row = lock_invoice(&mut tx, invoice_id, true).await?;
        ensure_visible(principal, &row)?;

        sqlx::query("UPDATE invoices SET is_deleted = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        row.invoice.is_deleted = false;

        tracing::info!(invoice_id, "Invoice restored");
        Ok(row.into())
    }

    async fn store(&self, conn: &mut PgConnection, invoice: &Invoice) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2, amount_paid = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.status)
        .bind(invoice.amount_paid)
        .bind(invoice.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn notify_paid(&self, invoice: &Invoice) {
        if let Err(e) = self.notifications.invoice_paid(invoice).await {
            tracing::error!(invoice_id = invoice.id, "Failed to record invoice paid notification: {}", e);
        }
    }
}
