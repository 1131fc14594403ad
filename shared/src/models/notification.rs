//! Notifications and the stock-level rules that raise them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stock strictly below this (and above zero) is reported as low
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// What a notification reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "notification_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StockOut,
    LowStock,
    OrderConfirmed,
    InvoicePaid,
    SupplierContacted,
}

impl NotificationKind {
    /// Kinds kept unique per product while unprocessed
    pub fn is_deduplicated(&self) -> bool {
        matches!(self, NotificationKind::StockOut | NotificationKind::LowStock)
    }
}

/// A notification about one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub kind: NotificationKind,
    pub product_id: i64,
    pub supplier_id: Option<String>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub is_processed: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Returns `false` when the notification was already read
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(now);
        true
    }

    /// Returns `false` when the notification was already processed
    pub fn mark_processed(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_processed {
            return false;
        }
        self.is_processed = true;
        self.processed_at = Some(now);
        true
    }
}

/// Stock level band of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Out,
    Low,
    Healthy,
}

impl StockLevel {
    pub fn classify(quantity: i32, low_threshold: i32) -> Self {
        if quantity <= 0 {
            StockLevel::Out
        } else if quantity < low_threshold {
            StockLevel::Low
        } else {
            StockLevel::Healthy
        }
    }

    /// Notification kind raised for this level, if any
    pub fn alert_kind(&self) -> Option<NotificationKind> {
        match self {
            StockLevel::Out => Some(NotificationKind::StockOut),
            StockLevel::Low => Some(NotificationKind::LowStock),
            StockLevel::Healthy => None,
        }
    }
}

/// Notifications to emit after an order was saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPlan {
    pub level: StockLevel,
    /// Threshold alert to get-or-create for the product
    pub threshold_alert: Option<NotificationKind>,
    /// Whether a newly created threshold alert fans out to suppliers
    pub contact_suppliers: bool,
    pub order_confirmed: bool,
}

/// Decide which notifications follow an order save leaving the product at `quantity`
pub fn plan_alerts(quantity: i32, low_threshold: i32, order_created: bool) -> AlertPlan {
    let level = StockLevel::classify(quantity, low_threshold);
    AlertPlan {
        level,
        threshold_alert: level.alert_kind(),
        contact_suppliers: level == StockLevel::Out,
        order_confirmed: order_created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_around_threshold() {
        assert_eq!(StockLevel::classify(0, LOW_STOCK_THRESHOLD), StockLevel::Out);
        assert_eq!(StockLevel::classify(1, LOW_STOCK_THRESHOLD), StockLevel::Low);
        assert_eq!(StockLevel::classify(9, LOW_STOCK_THRESHOLD), StockLevel::Low);
        assert_eq!(
            StockLevel::classify(10, LOW_STOCK_THRESHOLD),
            StockLevel::Healthy
        );
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let now = Utc::now();
        let mut notification = Notification {
            id: 1,
            kind: NotificationKind::LowStock,
            product_id: 1,
            supplier_id: None,
            title: "Low stock".into(),
            message: String::new(),
            is_read: false,
            is_processed: false,
            created_at: now,
            read_at: None,
            processed_at: None,
        };
        assert!(notification.mark_read(now));
        assert!(!notification.mark_read(now + chrono::Duration::minutes(5)));
        assert_eq!(notification.read_at, Some(now));
        assert!(!notification.is_processed);
    }
}
