//! Deletion history: write-once snapshots taken before a soft delete

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Invoice, Order, Product};

/// Kind of record a history entry refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "history_entity", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
    Order,
    Invoice,
}

/// Snapshot of a record as it was when it was deleted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct HistoryEntry {
    pub id: i64,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub snapshot: Value,
    pub deleted_at: DateTime<Utc>,
}

/// Records that can be soft-deleted and leave a history entry behind
pub trait Auditable {
    const ENTITY_TYPE: EntityType;

    fn entity_id(&self) -> i64;

    /// JSON object of the fields worth keeping
    fn snapshot(&self) -> Value;
}

impl Auditable for Product {
    const ENTITY_TYPE: EntityType = EntityType::Product;

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "quantity": self.quantity,
            "unit_price": self.unit_price,
            "supplier_id": self.supplier_id,
        })
    }
}

impl Auditable for Order {
    const ENTITY_TYPE: EntityType = EntityType::Order;

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> Value {
        json!({
            "product_id": self.product_id,
            "quantity": self.quantity,
            "unit_price": self.unit_price,
            "amount": self.amount(),
            "agent_id": self.agent_id,
            "payment_status": self.payment_status,
            "payment_date": self.payment_date,
        })
    }
}

impl Auditable for Invoice {
    const ENTITY_TYPE: EntityType = EntityType::Invoice;

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn snapshot(&self) -> Value {
        json!({
            "order_id": self.order_id,
            "total_amount": self.total_amount,
            "amount_paid": self.amount_paid,
            "status": self.status,
        })
    }
}
