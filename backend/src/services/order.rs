//! Order service: the stock ledger
//!
//! Every order mutation moves product stock in the same transaction, with the
//! product row locked (`FOR UPDATE`) so concurrent orders cannot oversell.
//! Rows are always locked order first, then products in ascending id order.
//! Alerting runs after commit and its failures never undo the order.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{Order, PaymentConfirmation, PaymentStatus, Principal, Resource, StockError};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::balance::{self, BalanceMovement};
use crate::services::product::{lock_product, store_quantity};
use crate::services::{audit, NotificationService};

const ORDER_COLUMNS: &str = "o.id, o.product_id, o.quantity, o.unit_price, o.agent_id, \
     o.payment_status, o.payment_confirmed, o.payment_date, o.created_at, o.is_deleted";

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    alerts: NotificationService,
}

/// Order joined with the product fields needed for display and scoping
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OrderRow {
    #[sqlx(flatten)]
    pub order: Order,
    pub product_name: String,
    pub product_supplier_id: Option<String>,
}

/// Order as returned by the API
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub product_name: String,
    pub amount: Decimal,
}

impl From<OrderRow> for OrderView {
    fn from(row: OrderRow) -> Self {
        Self {
            amount: row.order.amount(),
            order: row.order,
            product_name: row.product_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderInput {
    pub product_id: i64,
    pub quantity: i32,
}

/// Change quantity and/or product of an unpaid order
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub product_id: Option<i64>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub product_id: Option<i64>,
    pub payment_status: Option<PaymentStatus>,
    /// List deleted orders instead of live ones
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmationView {
    pub outcome: PaymentConfirmation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub order: OrderView,
}

/// Lock an order row (not its product) and load it with product details
pub(crate) async fn lock_order(
    conn: &mut PgConnection,
    order_id: i64,
    deleted: bool,
) -> AppResult<OrderRow> {
    sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}, p.name AS product_name, p.supplier_id AS product_supplier_id
        FROM orders o
        JOIN products p ON p.id = o.product_id
        WHERE o.id = $1 AND o.is_deleted = $2
        FOR UPDATE OF o
        "#
    ))
    .bind(order_id)
    .bind(deleted)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// Out-of-scope orders are reported exactly like missing ones
fn ensure_visible(principal: &Principal, row: &OrderRow) -> AppResult<()> {
    if principal
        .record_scope(Resource::Order)
        .admits(row.product_supplier_id.as_deref(), row.order.agent_id)
    {
        Ok(())
    } else {
        Err(AppError::NotFound("Order".to_string()))
    }
}

impl OrderService {
    pub fn new(db: PgPool, alerts: NotificationService) -> Self {
        Self { db, alerts }
    }

    /// Place an order, taking its quantity out of stock
    pub async fn place_order(&self, principal: &Principal, input: PlaceOrderInput) -> AppResult<OrderView> {
        let mut tx = self.db.begin().await?;

        let mut product = lock_product(&mut tx, input.product_id, false).await?;
        if !principal.product_scope().admits(product.supplier_id.as_deref(), None) {
            return Err(AppError::NotFound("Product".to_string()));
        }

        product.reserve(input.quantity)?;
        store_quantity(&mut tx, &product).await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (product_id, quantity, unit_price, agent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, quantity, unit_price, agent_id, payment_status,
                      payment_confirmed, payment_date, created_at, is_deleted
            "#,
        )
        .bind(product.id)
        .bind(input.quantity)
        .bind(product.unit_price)
        .bind(principal.user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = order.id,
            product_id = product.id,
            quantity = order.quantity,
            remaining = product.quantity,
            "Order placed"
        );

        self.run_alerts(&order, true).await;

        Ok(OrderRow {
            order,
            product_name: product.name,
            product_supplier_id: product.supplier_id,
        }
        .into())
    }

    pub async fn get(&self, principal: &Principal, order_id: i64) -> AppResult<OrderView> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, p.name AS product_name, p.supplier_id AS product_supplier_id
            FROM orders o
            JOIN products p ON p.id = o.product_id
            WHERE o.id = $1 AND o.is_deleted = FALSE
            "#
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        ensure_visible(principal, &row)?;
        Ok(row.into())
    }

    /// Orders visible to the principal, newest first
    pub async fn list(&self, principal: &Principal, query: OrderQuery) -> AppResult<Vec<OrderView>> {
        let scope = principal.record_scope(Resource::Order);

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, p.name AS product_name, p.supplier_id AS product_supplier_id
            FROM orders o
            JOIN products p ON p.id = o.product_id
            WHERE o.is_deleted = $1
              AND ($2::VARCHAR IS NULL OR p.supplier_id = $2)
              AND ($3::UUID IS NULL OR o.agent_id = $3)
              AND ($4::BIGINT IS NULL OR o.product_id = $4)
              AND ($5::payment_status IS NULL OR o.payment_status = $5)
            ORDER BY o.created_at DESC, o.id DESC
            "#
        ))
        .bind(query.deleted)
        .bind(scope.supplier_filter())
        .bind(scope.agent_filter())
        .bind(query.product_id)
        .bind(query.payment_status)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(OrderView::from).collect())
    }

    /// Change quantity or product, moving stock by the difference
    pub async fn update(
        &self,
        principal: &Principal,
        order_id: i64,
        input: UpdateOrderInput,
    ) -> AppResult<OrderView> {
        let mut tx = self.db.begin().await?;

        let mut row = lock_order(&mut tx, order_id, false).await?;
        ensure_visible(principal, &row)?;

        if row.order.payment_confirmed {
            return Err(AppError::InvalidStateTransition(
                "Paid orders cannot be modified".to_string(),
            ));
        }

        let new_quantity = input.quantity.unwrap_or(row.order.quantity);
        let new_product_id = input.product_id.unwrap_or(row.order.product_id);
        if new_quantity < 1 {
            return Err(StockError::NonPositiveQuantity(new_quantity).into());
        }

        if new_product_id == row.order.product_id {
            let mut product = lock_product(&mut tx, new_product_id, true).await?;
            let delta = new_quantity - row.order.quantity;
            if delta > 0 {
                product.reserve(delta)?;
            } else if delta < 0 {
                product.release(-delta)?;
            }
            store_quantity(&mut tx, &product).await?;
        } else {
            let old_id = row.order.product_id;
            let (mut old, mut new) = if old_id < new_product_id {
                let old = lock_product(&mut tx, old_id, true).await?;
                let new = lock_product(&mut tx, new_product_id, false).await?;
                (old, new)
            } else {
                let new = lock_product(&mut tx, new_product_id, false).await?;
                let old = lock_product(&mut tx, old_id, true).await?;
                (old, new)
            };
            if !principal.product_scope().admits(new.supplier_id.as_deref(), None) {
                return Err(AppError::NotFound("Product".to_string()));
            }

            old.release(row.order.quantity)?;
            new.reserve(new_quantity)?;
            store_quantity(&mut tx, &old).await?;
            store_quantity(&mut tx, &new).await?;

            row.order.unit_price = new.unit_price;
            row.product_name = new.name;
            row.product_supplier_id = new.supplier_id;
        }

        row.order.product_id = new_product_id;
        row.order.quantity = new_quantity;

        sqlx::query("UPDATE orders SET product_id = $2, quantity = $3, unit_price = $4 WHERE id = $1")
            .bind(order_id)
            .bind(row.order.product_id)
            .bind(row.order.quantity)
            .bind(row.order.unit_price)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id, product_id = new_product_id, quantity = new_quantity, "Order updated");

        self.run_alerts(&row.order, false).await;

        Ok(row.into())
    }

    /// Soft delete: stock goes back, a snapshot is kept, and a paid order's
    /// amount comes off its agent's balance
    pub async fn delete(&self, principal: &Principal, order_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let row = lock_order(&mut tx, order_id, false).await?;
        ensure_visible(principal, &row)?;
        let order = row.order;

        let mut product = lock_product(&mut tx, order.product_id, true).await?;
        product.release(order.quantity)?;
        store_quantity(&mut tx, &product).await?;

        audit::record_deletion(&mut tx, &order).await?;

        sqlx::query("UPDATE orders SET is_deleted = TRUE WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if let Some(agent_id) = order.credited_agent() {
            balance::apply_movement(&mut tx, agent_id, order.amount(), BalanceMovement::Debit).await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id,
            product_id = product.id,
            restored_quantity = order.quantity,
            "Order deleted"
        );
        Ok(())
    }

    /// Undo a soft delete, taking the stock out again
    pub async fn restore(&self, principal: &Principal, order_id: i64) -> AppResult<OrderView> {
        let mut tx = self.db.begin().await?;

        let mut row = lock_order(&mut tx, order_id, true).await?;
        ensure_visible(principal, &row)?;

        let mut product = lock_product(&mut tx, row.order.product_id, false).await?;
        product.reserve(row.order.quantity)?;
        store_quantity(&mut tx, &product).await?;

        sqlx::query("UPDATE orders SET is_deleted = FALSE WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if let Some(agent_id) = row.order.credited_agent() {
            balance::apply_movement(&mut tx, agent_id, row.order.amount(), BalanceMovement::Credit)
                .await?;
        }

        tx.commit().await?;
        row.order.is_deleted = false;

        tracing::info!(order_id, "Order restored");

        self.run_alerts(&row.order, false).await;

        Ok(row.into())
    }

    /// Confirm payment once; repeat calls report a warning and change nothing
    pub async fn confirm_payment(
        &self,
        principal: &Principal,
        order_id: i64,
    ) -> AppResult<PaymentConfirmationView> {
        let mut tx = self.db.begin().await?;

        let mut row = lock_order(&mut tx, order_id, false).await?;
        ensure_visible(principal, &row)?;

        let outcome = row.order.confirm_payment(Utc::now());
        let warning = match outcome {
            PaymentConfirmation::AlreadyConfirmed => {
                tracing::warn!(order_id, "Payment already confirmed");
                Some(format!("Payment for order #{} was already confirmed", order_id))
            }
            PaymentConfirmation::Confirmed => {
                sqlx::query(
                    r#"
                    UPDATE orders
                    SET payment_status = $2, payment_confirmed = TRUE, payment_date = $3
                    WHERE id = $1
                    "#,
                )
                .bind(order_id)
                .bind(row.order.payment_status)
                .bind(row.order.payment_date)
                .execute(&mut *tx)
                .await?;

                if let Some(agent_id) = row.order.agent_id {
                    balance::apply_movement(
                        &mut tx,
                        agent_id,
                        row.order.amount(),
                        BalanceMovement::Credit,
                    )
                    .await?;
                }

                tracing::info!(order_id, amount = %row.order.amount(), "Payment confirmed");
                None
            }
        };

        tx.commit().await?;

        Ok(PaymentConfirmationView {
            outcome,
            warning,
            order: row.into(),
        })
    }

    async fn run_alerts(&self, order: &Order, created: bool) {
        match self.alerts.after_order_saved(order, created).await {
            Ok(report) => tracing::debug!(order_id = order.id, ?report, "Alerting completed"),
            Err(e) => tracing::error!(order_id = order.id, "Alerting failed after order save: {}", e),
        }
    }
}
