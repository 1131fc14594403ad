//! Product model and the stock rules that guard its quantity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stocked product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub supplier_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Errors raised when a stock movement would break the ledger
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("quantity must be at least 1, got {0}")]
    NonPositiveQuantity(i32),

    #[error("requested {requested} units but only {available} in stock")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("returning {returned} units to a stock of {available} exceeds the largest storable quantity")]
    StockOverflow { returned: i32, available: i32 },
}

/// Check that `requested` units can leave a stock of `available`.
///
/// Returns the quantity left after the movement.
pub fn check_order_quantity(requested: i32, available: i32) -> Result<i32, StockError> {
    if requested < 1 {
        return Err(StockError::NonPositiveQuantity(requested));
    }
    if requested > available {
        return Err(StockError::InsufficientStock {
            requested,
            available,
        });
    }
    Ok(available - requested)
}

impl Product {
    /// Value of the stock on hand (`quantity × unit_price`)
    pub fn total_stock_value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }

    /// Take `quantity` units out of stock, leaving the product untouched on error
    pub fn reserve(&mut self, quantity: i32) -> Result<(), StockError> {
        self.quantity = check_order_quantity(quantity, self.quantity)?;
        Ok(())
    }

    /// Put `quantity` units back into stock
    pub fn release(&mut self, quantity: i32) -> Result<(), StockError> {
        if quantity < 1 {
            return Err(StockError::NonPositiveQuantity(quantity));
        }
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or(StockError::StockOverflow {
                returned: quantity,
                available: self.quantity,
            })?;
        Ok(())
    }
}
