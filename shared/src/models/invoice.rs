//! Invoice model and its status machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invoice_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Validated,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Allowed moves: draft → validated → paid, and anything → cancelled
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (InvoiceStatus::Draft, InvoiceStatus::Validated)
                | (InvoiceStatus::Validated, InvoiceStatus::Paid)
                | (_, InvoiceStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Validated => "validated",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

/// Errors from invoice state changes
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvoiceError {
    #[error("cannot move invoice from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    #[error("payment amount must be positive")]
    NonPositivePayment,

    #[error("payment exceeds remaining balance of {remaining}")]
    Overpayment { remaining: Decimal },

    #[error("invoice in status {} does not accept payments", .0.as_str())]
    NotPayable(InvoiceStatus),
}

/// Invoice issued for one order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub order_id: Option<i64>,
    /// Amount captured from the order when the invoice was issued
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub status: InvoiceStatus,
    pub agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Invoice {
    pub fn remaining_balance(&self) -> Decimal {
        self.total_amount - self.amount_paid
    }

    /// Move to `next`. Reaching `paid` settles the whole amount.
    pub fn transition(&mut self, next: InvoiceStatus) -> Result<(), InvoiceError> {
        if !self.status.can_transition_to(next) {
            return Err(InvoiceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == InvoiceStatus::Paid {
            self.amount_paid = self.total_amount;
        }
        self.status = next;
        Ok(())
    }

    /// Record a partial or full payment on a validated invoice.
    ///
    /// Returns `true` when the payment settled the invoice and moved it to `paid`.
    pub fn record_payment(&mut self, amount: Decimal) -> Result<bool, InvoiceError> {
        if self.status != InvoiceStatus::Validated {
            return Err(InvoiceError::NotPayable(self.status));
        }
        if amount <= Decimal::ZERO {
            return Err(InvoiceError::NonPositivePayment);
        }
        let remaining = self.remaining_balance();
        if amount > remaining {
            return Err(InvoiceError::Overpayment { remaining });
        }
        self.amount_paid += amount;
        if self.remaining_balance().is_zero() {
            self.status = InvoiceStatus::Paid;
            return Ok(true);
        }
        Ok(false)
    }
}
