//! Order model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// A sale of some quantity of one product, placed by an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Product price captured when the order was placed
    pub unit_price: Decimal,
    pub agent_id: Option<Uuid>,
    pub payment_status: PaymentStatus,
    pub payment_confirmed: bool,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Result of confirming payment on an order
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentConfirmation {
    Confirmed,
    AlreadyConfirmed,
}

/// Order amount for a quantity at a unit price
pub fn order_amount(quantity: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

impl Order {
    pub fn amount(&self) -> Decimal {
        order_amount(self.quantity, self.unit_price)
    }

    /// Mark the order paid. A second call changes nothing.
    pub fn confirm_payment(&mut self, now: DateTime<Utc>) -> PaymentConfirmation {
        if self.payment_confirmed {
            return PaymentConfirmation::AlreadyConfirmed;
        }
        self.payment_confirmed = true;
        self.payment_status = PaymentStatus::Paid;
        self.payment_date = Some(now);
        PaymentConfirmation::Confirmed
    }

    /// Whether removing or restoring this order moves money on an agent balance
    pub fn credited_agent(&self) -> Option<Uuid> {
        if self.payment_confirmed {
            self.agent_id
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending_order() -> Order {
        Order {
            id: 7,
            product_id: 1,
            quantity: 3,
            unit_price: "4.25".parse().unwrap(),
            agent_id: Some(Uuid::new_v4()),
            payment_status: PaymentStatus::Pending,
            payment_confirmed: false,
            payment_date: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    #[test]
    fn test_amount_uses_captured_price() {
        assert_eq!(pending_order().amount(), "12.75".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_confirm_payment_twice_keeps_first_date() {
        let mut order = pending_order();
        let first = Utc::now();
        assert_eq!(order.confirm_payment(first), PaymentConfirmation::Confirmed);
        assert_eq!(
            order.confirm_payment(first + Duration::hours(1)),
            PaymentConfirmation::AlreadyConfirmed
        );
        assert_eq!(order.payment_date, Some(first));
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_credited_agent_only_when_paid() {
        let mut order = pending_order();
        assert_eq!(order.credited_agent(), None);
        order.confirm_payment(Utc::now());
        assert_eq!(order.credited_agent(), order.agent_id);
    }
}
