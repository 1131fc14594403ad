//! Supplier directory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default delivery lead time for a new product/supplier link, in days
pub const DEFAULT_LEAD_TIME_DAYS: i32 = 7;

/// Default minimum order quantity for a new product/supplier link
pub const DEFAULT_MIN_ORDER_QUANTITY: i32 = 10;

/// A supplier. `id` is a slug code derived from the name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    /// Dashboard account linked to this supplier
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Purchasing terms between one product and one supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierLink {
    pub id: i64,
    pub product_id: i64,
    pub supplier_id: String,
    pub supplier_price: Decimal,
    pub lead_time_days: i32,
    pub min_order_quantity: i32,
    pub is_principal: bool,
    pub created_at: DateTime<Utc>,
}

impl SupplierLink {
    /// Cost of restocking at the minimum order quantity
    pub fn suggested_order_total(&self) -> Decimal {
        Decimal::from(self.min_order_quantity) * self.supplier_price
    }
}

/// Contact order: principal suppliers first, then cheapest first
pub fn sort_for_contact<T>(items: &mut [T], link_of: impl Fn(&T) -> &SupplierLink) {
    items.sort_by(|a, b| {
        let (a, b) = (link_of(a), link_of(b));
        b.is_principal
            .cmp(&a.is_principal)
            .then(a.supplier_price.cmp(&b.supplier_price))
    });
}
