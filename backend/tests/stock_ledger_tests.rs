//! Stock ledger tests
//!
//! Property-based and unit tests for:
//! - Orders take exactly their quantity out of stock
//! - Oversized orders leave stock untouched
//! - Deleting an order puts its quantity back
//! - Order amounts use the price captured at placement

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{check_order_quantity, order_amount, Order, PaymentStatus, Product, StockError};
use uuid::Uuid;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_widget_sells_out() {
        let mut widget = integration_helpers::product("Widget", 10, "5.0");
        widget.reserve(10).unwrap();

        assert_eq!(widget.quantity, 0);
        assert!(!widget.is_available());

        let order = integration_helpers::order_for(&widget, 10);
        assert_eq!(order.amount(), "50.0".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_order_then_delete_restores_stock() {
        let mut product = integration_helpers::product("Bolt", 5, "1.20");

        product.reserve(3).unwrap();
        assert_eq!(product.quantity, 2);

        product.release(3).unwrap();
        assert_eq!(product.quantity, 5);
    }

    #[test]
    fn test_oversized_order_leaves_stock_alone() {
        let mut product = integration_helpers::product("Nut", 4, "0.10");

        let result = product.reserve(5);

        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                requested: 5,
                available: 4
            })
        );
        assert_eq!(product.quantity, 4);
    }

    #[test]
    fn test_zero_and_negative_orders_rejected() {
        assert_eq!(check_order_quantity(0, 10), Err(StockError::NonPositiveQuantity(0)));
        assert_eq!(check_order_quantity(-2, 10), Err(StockError::NonPositiveQuantity(-2)));
    }

    #[test]
    fn test_exact_stock_can_be_ordered() {
        assert_eq!(check_order_quantity(7, 7), Ok(0));
    }

    #[test]
    fn test_release_rejects_non_positive() {
        let mut product = integration_helpers::product("Washer", 1, "0.05");
        assert!(product.release(0).is_err());
        assert_eq!(product.quantity, 1);
    }

    #[test]
    fn test_captured_price_survives_catalogue_change() {
        let mut product = integration_helpers::product("Gear", 20, "2.50");
        let order = integration_helpers::order_for(&product, 4);

        product.unit_price = "9.99".parse().unwrap();

        assert_eq!(order.amount(), "10.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_total_stock_value() {
        let product = integration_helpers::product("Spring", 12, "0.25");
        assert_eq!(product.total_stock_value(), "3.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_quantity_change_on_update_moves_difference() {
        // Order for 3 raised to 5 takes 2 more; lowered to 1 puts 2 back
        let mut product = integration_helpers::product("Cog", 10, "1");
        product.reserve(3).unwrap();

        product.reserve(5 - 3).unwrap();
        assert_eq!(product.quantity, 5);

        product.release(5 - 1).unwrap();
        assert_eq!(product.quantity, 9);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Placing an order within stock decrements by exactly its quantity
        #[test]
        fn prop_order_decrements_exactly(stock in 1i32..10_000, pick in 0.0f64..1.0) {
            let quantity = ((stock as f64 * pick) as i32).max(1);
            let mut product = integration_helpers::product("P", stock, "1");

            product.reserve(quantity).unwrap();

            prop_assert_eq!(product.quantity, stock - quantity);
        }

        /// Orders larger than stock fail and change nothing
        #[test]
        fn prop_oversell_is_rejected(stock in 0i32..10_000, extra in 1i32..1_000) {
            let mut product = integration_helpers::product("P", stock, "1");

            let result = product.reserve(stock + extra);

            let is_insufficient = matches!(result, Err(StockError::InsufficientStock { .. }));
            prop_assert!(is_insufficient);
            prop_assert_eq!(product.quantity, stock);
        }

        /// Stock never goes negative through reserve
        #[test]
        fn prop_stock_never_negative(stock in 0i32..1_000, requests in prop::collection::vec(-5i32..50, 0..30)) {
            let mut product = integration_helpers::product("P", stock, "1");
            for q in requests {
                let _ = product.reserve(q);
                prop_assert!(product.quantity >= 0);
            }
        }

        /// Reserve followed by release is the identity
        #[test]
        fn prop_delete_restores_quantity(stock in 1i32..10_000, quantity in 1i32..10_000) {
            prop_assume!(quantity <= stock);
            let mut product = integration_helpers::product("P", stock, "1");

            product.reserve(quantity).unwrap();
            product.release(quantity).unwrap();

            prop_assert_eq!(product.quantity, stock);
        }

        /// amount = quantity × unit_price
        #[test]
        fn prop_amount_is_quantity_times_price(quantity in 1i32..10_000, price in price_strategy()) {
            prop_assert_eq!(order_amount(quantity, price), Decimal::from(quantity) * price);
        }
    }
}

// ============================================================================
// Integration Test Helpers
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    pub fn product(name: &str, quantity: i32, price: &str) -> Product {
        Product {
            id: 1,
            name: name.to_string(),
            description: None,
            quantity,
            unit_price: price.parse().unwrap(),
            image_url: None,
            supplier_id: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    pub fn order_for(product: &Product, quantity: i32) -> Order {
        Order {
            id: 1,
            product_id: product.id,
            quantity,
            unit_price: product.unit_price,
            agent_id: Some(Uuid::new_v4()),
            payment_status: PaymentStatus::Pending,
            payment_confirmed: false,
            payment_date: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }
}
