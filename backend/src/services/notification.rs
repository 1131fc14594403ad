//! Stock alerting and notification management
//!
//! The order ledger calls [`NotificationService::after_order_saved`] once its
//! transaction has committed. The hook reads the product's fresh quantity and:
//! - at zero, opens a `stock_out` alert and, the first time only, contacts
//!   every active supplier linked to the product
//! - below the low-stock threshold, opens a `low_stock` alert
//! - for a newly placed order, records an `order_confirmed` notification
//!
//! Open alerts are unique per product and kind until processed. A delivery
//! failure to one supplier is logged and never stops the others.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    plan_alerts, sort_for_contact, Invoice, Notification, NotificationKind, Order, Product,
    SupplierLink,
};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::external::{ContactDispatcher, ContactMessage};

const NOTIFICATION_COLUMNS: &str = "id, kind, product_id, supplier_id, title, message, is_read, \
     is_processed, created_at, read_at, processed_at";

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    store: PgAlertStore,
    dispatcher: Arc<dyn ContactDispatcher>,
    low_stock_threshold: i32,
}

/// An active supplier linked to a product, with its contact details
#[derive(Debug, Clone, FromRow)]
pub struct SupplierContact {
    #[sqlx(flatten)]
    pub link: SupplierLink,
    pub supplier_name: String,
    pub supplier_email: String,
}

/// Outcome of contacting one supplier
#[derive(Debug, Clone, Serialize)]
pub struct ContactAttempt {
    pub supplier_id: String,
    pub supplier_name: String,
    pub error: Option<String>,
}

impl ContactAttempt {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// What the post-save hook did
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertReport {
    pub threshold_alert: Option<NotificationKind>,
    pub threshold_alert_created: bool,
    pub suppliers_contacted: Vec<ContactAttempt>,
    pub order_confirmed: bool,
}

/// Filters for listing notifications
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub kind: Option<NotificationKind>,
    pub product_id: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub unprocessed_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

/// Storage used by the alerting workflow
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Current state of a product, deleted or not
    async fn product(&self, product_id: i64) -> AppResult<Product>;

    /// Insert a notification. Deduplicated kinds reuse the open alert for the
    /// product instead. Returns the notification and whether it is new.
    async fn get_or_create(
        &self,
        kind: NotificationKind,
        product_id: i64,
        supplier_id: Option<&str>,
        title: &str,
        message: &str,
    ) -> AppResult<(Notification, bool)>;

    /// Active suppliers linked to a product, in any order
    async fn supplier_contacts(&self, product_id: i64) -> AppResult<Vec<SupplierContact>>;
}

/// Postgres-backed alert storage
#[derive(Clone)]
pub struct PgAlertStore {
    db: PgPool,
}

impl PgAlertStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn product(&self, product_id: i64) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, quantity, unit_price, image_url, supplier_id,
                   created_at, is_deleted
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    async fn get_or_create(
        &self,
        kind: NotificationKind,
        product_id: i64,
        supplier_id: Option<&str>,
        title: &str,
        message: &str,
    ) -> AppResult<(Notification, bool)> {
        if !kind.is_deduplicated() {
            let notification = sqlx::query_as::<_, Notification>(&format!(
                r#"
                INSERT INTO notifications (kind, product_id, supplier_id, title, message)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {NOTIFICATION_COLUMNS}
                "#
            ))
            .bind(kind)
            .bind(product_id)
            .bind(supplier_id)
            .bind(title)
            .bind(message)
            .fetch_one(&self.db)
            .await?;
            return Ok((notification, true));
        }

        let inserted = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (kind, product_id, supplier_id, title, message)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_id, kind)
                WHERE is_processed = FALSE AND kind IN ('stock_out', 'low_stock')
            DO NOTHING
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(kind)
        .bind(product_id)
        .bind(supplier_id)
        .bind(title)
        .bind(message)
        .fetch_optional(&self.db)
        .await?;

        if let Some(notification) = inserted {
            return Ok((notification, true));
        }

        let existing = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE product_id = $1 AND kind = $2 AND is_processed = FALSE
            "#
        ))
        .bind(product_id)
        .bind(kind)
        .fetch_one(&self.db)
        .await?;

        Ok((existing, false))
    }

    async fn supplier_contacts(&self, product_id: i64) -> AppResult<Vec<SupplierContact>> {
        let contacts = sqlx::query_as::<_, SupplierContact>(
            r#"
            SELECT l.id, l.product_id, l.supplier_id, l.supplier_price, l.lead_time_days,
                   l.min_order_quantity, l.is_principal, l.created_at,
                   s.name AS supplier_name, s.email AS supplier_email
            FROM product_suppliers l
            JOIN suppliers s ON s.id = l.supplier_id
            WHERE l.product_id = $1 AND s.is_active = true
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(contacts)
    }
}

impl NotificationService {
    pub fn new(db: PgPool, dispatcher: Arc<dyn ContactDispatcher>, low_stock_threshold: i32) -> Self {
        Self {
            store: PgAlertStore::new(db.clone()),
            db,
            dispatcher,
            low_stock_threshold,
        }
    }

    // ========================================================================
    // Alerting
    // ========================================================================

    /// Post-commit hook for a saved, non-deleted order
    pub async fn after_order_saved(&self, order: &Order, created: bool) -> AppResult<AlertReport> {
        run_alerts(
            &self.store,
            self.dispatcher.as_ref(),
            self.low_stock_threshold,
            order,
            created,
        )
        .await
    }

    /// Notify that an invoice has been paid in full
    pub async fn invoice_paid(&self, invoice: &Invoice) -> AppResult<()> {
        let Some(order_id) = invoice.order_id else {
            tracing::debug!(invoice_id = invoice.id, "Paid invoice has no order, skipping notification");
            return Ok(());
        };

        let product = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT p.id, p.name
            FROM orders o
            JOIN products p ON p.id = o.product_id
            WHERE o.id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some((product_id, product_name)) = product {
            let title = format!("Invoice #{} paid", invoice.id);
            let message = format!(
                "Invoice #{} for order #{} ({}) was paid: {}",
                invoice.id, order_id, product_name, invoice.total_amount
            );
            self.store
                .get_or_create(NotificationKind::InvoicePaid, product_id, None, &title, &message)
                .await?;
        }

        Ok(())
    }

    // ========================================================================
    // Inbox
    // ========================================================================

    /// List notifications, newest first
    pub async fn list(&self, query: NotificationQuery) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE ($1::notification_kind IS NULL OR kind = $1)
              AND ($2::BIGINT IS NULL OR product_id = $2)
              AND (NOT $3 OR is_read = FALSE)
              AND (NOT $4 OR is_processed = FALSE)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(query.kind)
        .bind(query.product_id)
        .bind(query.unread_only)
        .bind(query.unprocessed_only)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_count(&self) -> AppResult<UnreadCount> {
        let unread =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE is_read = FALSE")
                .fetch_one(&self.db)
                .await?;
        Ok(UnreadCount { unread })
    }

    /// Mark as read. Already-read notifications are returned unchanged.
    pub async fn mark_read(&self, id: i64) -> AppResult<Notification> {
        self.update_flags(id, |n| n.mark_read(Utc::now())).await
    }

    /// Mark as processed. A later breach will open a new alert.
    pub async fn mark_processed(&self, id: i64) -> AppResult<Notification> {
        self.update_flags(id, |n| n.mark_processed(Utc::now())).await
    }

    async fn update_flags(
        &self,
        id: i64,
        apply: impl FnOnce(&mut Notification) -> bool,
    ) -> AppResult<Notification> {
        let mut tx = self.db.begin().await?;

        let mut notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))?;

        if apply(&mut notification) {
            sqlx::query(
                r#"
                UPDATE notifications
                SET is_read = $2, read_at = $3, is_processed = $4, processed_at = $5
                WHERE id = $1
                "#,
            )
            .bind(notification.id)
            .bind(notification.is_read)
            .bind(notification.read_at)
            .bind(notification.is_processed)
            .bind(notification.processed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(notification)
    }
}

/// Raise the notifications that follow an order save.
///
/// Suppliers are contacted only when the `stock_out` alert is newly opened;
/// a breach while the alert is still unprocessed reuses it silently.
pub async fn run_alerts(
    store: &dyn AlertStore,
    dispatcher: &dyn ContactDispatcher,
    low_stock_threshold: i32,
    order: &Order,
    created: bool,
) -> AppResult<AlertReport> {
    let product = store.product(order.product_id).await?;

    let plan = plan_alerts(product.quantity, low_stock_threshold, created);
    let mut report = AlertReport {
        threshold_alert: plan.threshold_alert,
        ..AlertReport::default()
    };

    if let Some(kind) = plan.threshold_alert {
        let (title, message) = threshold_alert_text(&product, kind);
        let (_, fresh) = store
            .get_or_create(kind, product.id, None, &title, &message)
            .await?;
        report.threshold_alert_created = fresh;

        if fresh {
            tracing::info!(
                product_id = product.id,
                quantity = product.quantity,
                ?kind,
                "Opened stock alert"
            );
        }

        if fresh && plan.contact_suppliers {
            report.suppliers_contacted = contact_suppliers(store, dispatcher, &product).await?;
        }
    }

    if plan.order_confirmed {
        let (title, message) = order_confirmed_text(order, &product);
        store
            .get_or_create(
                NotificationKind::OrderConfirmed,
                product.id,
                None,
                &title,
                &message,
            )
            .await?;
        report.order_confirmed = true;
    }

    Ok(report)
}

/// Contact every active supplier of `product` and log one
/// `supplier_contacted` notification per supplier
async fn contact_suppliers(
    store: &dyn AlertStore,
    dispatcher: &dyn ContactDispatcher,
    product: &Product,
) -> AppResult<Vec<ContactAttempt>> {
    let mut contacts = store.supplier_contacts(product.id).await?;
    sort_for_contact(&mut contacts, |c| &c.link);

    if contacts.is_empty() {
        tracing::warn!(product_id = product.id, "Product is out of stock and has no active supplier");
        return Ok(Vec::new());
    }

    let attempts = dispatch_contacts(dispatcher, product, &contacts).await;

    for (contact, attempt) in contacts.iter().zip(&attempts) {
        let (title, message) = supplier_contacted_text(product, contact, attempt);
        if let Err(e) = store
            .get_or_create(
                NotificationKind::SupplierContacted,
                product.id,
                Some(&contact.link.supplier_id),
                &title,
                &message,
            )
            .await
        {
            tracing::error!(
                supplier_id = %contact.link.supplier_id,
                "Failed to record supplier contact: {}",
                e
            );
        }
    }

    Ok(attempts)
}

/// Send one contact message per supplier, in order. Failures are logged
/// and reported per supplier; they never stop the remaining sends.
pub async fn dispatch_contacts(
    dispatcher: &dyn ContactDispatcher,
    product: &Product,
    contacts: &[SupplierContact],
) -> Vec<ContactAttempt> {
    let mut attempts = Vec::with_capacity(contacts.len());

    for contact in contacts {
        let message = supplier_contact_message(product, contact);
        let error = match dispatcher.send(&message).await {
            Ok(()) => {
                tracing::info!(
                    supplier_id = %contact.link.supplier_id,
                    product_id = product.id,
                    "Supplier contacted about stock out"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    supplier_id = %contact.link.supplier_id,
                    product_id = product.id,
                    "Failed to contact supplier: {}",
                    e
                );
                Some(e.to_string())
            }
        };

        attempts.push(ContactAttempt {
            supplier_id: contact.link.supplier_id.clone(),
            supplier_name: contact.supplier_name.clone(),
            error,
        });
    }

    attempts
}

// ============================================================================
// Message Builders
// ============================================================================

/// Title and body for a stock_out or low_stock alert
pub fn threshold_alert_text(product: &Product, kind: NotificationKind) -> (String, String) {
    match kind {
        NotificationKind::StockOut => (
            format!("Out of stock: {}", product.name),
            format!("Product \"{}\" is out of stock.", product.name),
        ),
        _ => (
            format!("Low stock: {}", product.name),
            format!(
                "Product \"{}\" is running low: {} unit(s) left.",
                product.name, product.quantity
            ),
        ),
    }
}

pub fn order_confirmed_text(order: &Order, product: &Product) -> (String, String) {
    (
        format!("Order #{} confirmed", order.id),
        format!(
            "Order #{} for {} x \"{}\" confirmed, amount {}.",
            order.id,
            order.quantity,
            product.name,
            order.amount()
        ),
    )
}

/// Restocking request sent to a supplier
pub fn supplier_contact_message(product: &Product, contact: &SupplierContact) -> ContactMessage {
    let link = &contact.link;
    ContactMessage {
        to: contact.supplier_email.clone(),
        subject: format!("Restocking request: {}", product.name),
        body: format!(
            "Hello {},\n\n\
             Product \"{}\" is out of stock. Please send us a quote for restocking.\n\n\
             Minimum order quantity: {}\n\
             Lead time: {} day(s)\n\
             Agreed unit price: {}\n\
             Estimated total: {}\n\n\
             Thank you.",
            contact.supplier_name,
            product.name,
            link.min_order_quantity,
            link.lead_time_days,
            link.supplier_price,
            link.suggested_order_total(),
        ),
    }
}

pub fn supplier_contacted_text(
    product: &Product,
    contact: &SupplierContact,
    attempt: &ContactAttempt,
) -> (String, String) {
    let link = &contact.link;
    let delivery = match &attempt.error {
        None => "Message sent.".to_string(),
        Some(e) => format!("Delivery failed: {}.", e),
    };
    (
        format!("Supplier {} contacted", contact.supplier_name),
        format!(
            "Supplier {} contacted to restock \"{}\": minimum {} unit(s), {} day(s) lead time, \
             unit price {}. {}",
            contact.supplier_name,
            product.name,
            link.min_order_quantity,
            link.lead_time_days,
            link.supplier_price,
            delivery
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::DispatchError;
    use rust_decimal::Decimal;
    use shared::PaymentStatus;
    use std::sync::Mutex;

    /// Records every send and fails for one address
    struct FakeDispatcher {
        failing_address: String,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContactDispatcher for FakeDispatcher {
        async fn send(&self, message: &ContactMessage) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push(message.to.clone());
            if message.to == self.failing_address {
                return Err(DispatchError::Transport("connection refused".into()));
            }
            Ok(())
        }
    }

    fn product() -> Product {
        Product {
            id: 1,
            name: "Widget".into(),
            description: None,
            quantity: 0,
            unit_price: Decimal::new(500, 2),
            image_url: None,
            supplier_id: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    fn contact(id: &str, principal: bool) -> SupplierContact {
        SupplierContact {
            link: SupplierLink {
                id: 0,
                product_id: 1,
                supplier_id: id.into(),
                supplier_price: Decimal::new(350, 2),
                lead_time_days: 7,
                min_order_quantity: 10,
                is_principal: principal,
                created_at: Utc::now(),
            },
            supplier_name: id.to_uppercase(),
            supplier_email: format!("{id}@example.com"),
        }
    }

    #[test]
    fn test_failed_supplier_does_not_block_others() {
        let dispatcher = FakeDispatcher {
            failing_address: "beta@example.com".into(),
            sent: Mutex::new(Vec::new()),
        };
        let contacts = vec![contact("alpha", true), contact("beta", false), contact("gamma", false)];

        let attempts =
            tokio_test::block_on(dispatch_contacts(&dispatcher, &product(), &contacts));

        assert_eq!(attempts.len(), 3);
        assert!(attempts[0].delivered());
        assert!(!attempts[1].delivered());
        assert!(attempts[2].delivered());
        assert_eq!(dispatcher.sent.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_contact_message_names_terms() {
        let message = supplier_contact_message(&product(), &contact("alpha", true));
        assert_eq!(message.to, "alpha@example.com");
        assert!(message.body.contains("Minimum order quantity: 10"));
        assert!(message.body.contains("Lead time: 7 day(s)"));
        assert!(message.body.contains("Estimated total: 35.00"));
    }

    #[test]
    fn test_failed_delivery_is_noted_in_notification() {
        let attempt = ContactAttempt {
            supplier_id: "beta".into(),
            supplier_name: "BETA".into(),
            error: Some("timeout".into()),
        };
        let (_, message) = supplier_contacted_text(&product(), &contact("beta", false), &attempt);
        assert!(message.ends_with("Delivery failed: timeout."));
    }

    // ------------------------------------------------------------------------
    // Alerting workflow against an in-memory store
    // ------------------------------------------------------------------------

    /// Keeps notifications in memory with the same open-alert uniqueness as
    /// the partial index on `notifications`
    struct MemoryStore {
        product: Mutex<Product>,
        contacts: Vec<SupplierContact>,
        notifications: Mutex<Vec<Notification>>,
    }

    impl MemoryStore {
        fn new(quantity: i32, contacts: Vec<SupplierContact>) -> Self {
            Self {
                product: Mutex::new(Product {
                    quantity,
                    ..product()
                }),
                contacts,
                notifications: Mutex::new(Vec::new()),
            }
        }

        fn count(&self, kind: NotificationKind) -> usize {
            self.notifications
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.kind == kind)
                .count()
        }

        fn open(&self, kind: NotificationKind) -> usize {
            self.notifications
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.kind == kind && !n.is_processed)
                .count()
        }

        fn process_all(&self, kind: NotificationKind) {
            for n in self.notifications.lock().unwrap().iter_mut() {
                if n.kind == kind {
                    n.mark_processed(Utc::now());
                }
            }
        }
    }

    #[async_trait]
    impl AlertStore for MemoryStore {
        async fn product(&self, _product_id: i64) -> AppResult<Product> {
            Ok(self.product.lock().unwrap().clone())
        }

        async fn get_or_create(
            &self,
            kind: NotificationKind,
            product_id: i64,
            supplier_id: Option<&str>,
            title: &str,
            message: &str,
        ) -> AppResult<(Notification, bool)> {
            let mut all = self.notifications.lock().unwrap();
            if kind.is_deduplicated() {
                if let Some(existing) = all
                    .iter()
                    .find(|n| n.product_id == product_id && n.kind == kind && !n.is_processed)
                {
                    return Ok((existing.clone(), false));
                }
            }

            let notification = Notification {
                id: all.len() as i64 + 1,
                kind,
                product_id,
                supplier_id: supplier_id.map(str::to_string),
                title: title.to_string(),
                message: message.to_string(),
                is_read: false,
                is_processed: false,
                created_at: Utc::now(),
                read_at: None,
                processed_at: None,
            };
            all.push(notification.clone());
            Ok((notification, true))
        }

        async fn supplier_contacts(&self, _product_id: i64) -> AppResult<Vec<SupplierContact>> {
            Ok(self.contacts.clone())
        }
    }

    fn dispatcher(failing_address: &str) -> FakeDispatcher {
        FakeDispatcher {
            failing_address: failing_address.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn order() -> Order {
        Order {
            id: 7,
            product_id: 1,
            quantity: 1,
            unit_price: Decimal::new(500, 2),
            agent_id: None,
            payment_status: PaymentStatus::Pending,
            payment_confirmed: false,
            payment_date: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    fn suppliers() -> Vec<SupplierContact> {
        vec![contact("gamma", false), contact("alpha", true), contact("beta", false)]
    }

    fn run(store: &MemoryStore, dispatcher: &FakeDispatcher, created: bool) -> AlertReport {
        tokio_test::block_on(run_alerts(store, dispatcher, 10, &order(), created)).unwrap()
    }

    #[test]
    fn test_stock_out_contacts_each_active_supplier_once() {
        let store = MemoryStore::new(0, suppliers());
        let dispatcher = dispatcher("");

        let report = run(&store, &dispatcher, true);

        assert_eq!(report.threshold_alert, Some(NotificationKind::StockOut));
        assert!(report.threshold_alert_created);
        assert!(report.order_confirmed);
        assert_eq!(report.suppliers_contacted.len(), 3);
        assert_eq!(store.count(NotificationKind::StockOut), 1);
        assert_eq!(store.count(NotificationKind::SupplierContacted), 3);
        assert_eq!(store.count(NotificationKind::OrderConfirmed), 1);
        assert_eq!(dispatcher.sent.lock().unwrap()[0], "alpha@example.com");
    }

    #[test]
    fn test_repeat_breach_reuses_open_alert_without_contacting() {
        let store = MemoryStore::new(0, suppliers());
        let dispatcher = dispatcher("");

        run(&store, &dispatcher, true);
        let second = run(&store, &dispatcher, false);

        assert!(!second.threshold_alert_created);
        assert!(second.suppliers_contacted.is_empty());
        assert!(!second.order_confirmed);
        assert_eq!(store.count(NotificationKind::StockOut), 1);
        assert_eq!(store.count(NotificationKind::SupplierContacted), 3);
        assert_eq!(dispatcher.sent.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_breach_after_processing_opens_new_alert() {
        let store = MemoryStore::new(0, suppliers());
        let dispatcher = dispatcher("");

        run(&store, &dispatcher, true);
        store.process_all(NotificationKind::StockOut);
        let again = run(&store, &dispatcher, true);

        assert!(again.threshold_alert_created);
        assert_eq!(store.count(NotificationKind::StockOut), 2);
        assert_eq!(store.open(NotificationKind::StockOut), 1);
        assert_eq!(store.count(NotificationKind::SupplierContacted), 6);
    }

    #[test]
    fn test_low_stock_never_contacts_suppliers() {
        let store = MemoryStore::new(8, suppliers());
        let dispatcher = dispatcher("");

        let report = run(&store, &dispatcher, true);

        assert_eq!(report.threshold_alert, Some(NotificationKind::LowStock));
        assert!(report.suppliers_contacted.is_empty());
        assert_eq!(store.open(NotificationKind::LowStock), 1);
        assert_eq!(store.count(NotificationKind::SupplierContacted), 0);
        assert!(dispatcher.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_delivery_is_still_recorded() {
        let store = MemoryStore::new(0, suppliers());
        let dispatcher = dispatcher("beta@example.com");

        let report = run(&store, &dispatcher, true);

        assert_eq!(report.suppliers_contacted.iter().filter(|a| !a.delivered()).count(), 1);
        assert_eq!(store.count(NotificationKind::SupplierContacted), 3);
    }

    #[test]
    fn test_healthy_stock_raises_only_order_confirmation() {
        let store = MemoryStore::new(25, suppliers());
        let report = run(&store, &dispatcher(""), true);

        assert_eq!(report.threshold_alert, None);
        assert_eq!(store.count(NotificationKind::OrderConfirmed), 1);
        assert_eq!(store.notifications.lock().unwrap().len(), 1);
    }
}
