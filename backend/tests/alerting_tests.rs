//! Alerting workflow tests
//!
//! Covers the stock level bands, which notifications an order save raises,
//! the read/processed flags and supplier contact order.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    plan_alerts, sort_for_contact, Notification, NotificationKind, StockLevel, SupplierLink,
    LOW_STOCK_THRESHOLD,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_one_to_zero_raises_stock_out_and_contacts_suppliers() {
        let plan = plan_alerts(0, LOW_STOCK_THRESHOLD, true);

        assert_eq!(plan.level, StockLevel::Out);
        assert_eq!(plan.threshold_alert, Some(NotificationKind::StockOut));
        assert!(plan.contact_suppliers);
        assert!(plan.order_confirmed);
    }

    #[test]
    fn test_fifteen_to_eight_raises_low_stock_only() {
        let plan = plan_alerts(8, LOW_STOCK_THRESHOLD, true);

        assert_eq!(plan.level, StockLevel::Low);
        assert_eq!(plan.threshold_alert, Some(NotificationKind::LowStock));
        assert!(!plan.contact_suppliers);
    }

    #[test]
    fn test_threshold_itself_is_healthy() {
        let plan = plan_alerts(LOW_STOCK_THRESHOLD, LOW_STOCK_THRESHOLD, true);
        assert_eq!(plan.level, StockLevel::Healthy);
        assert_eq!(plan.threshold_alert, None);
    }

    #[test]
    fn test_updates_do_not_confirm_orders() {
        let plan = plan_alerts(50, LOW_STOCK_THRESHOLD, false);
        assert!(!plan.order_confirmed);
        assert_eq!(plan.threshold_alert, None);
    }

    #[test]
    fn test_only_threshold_kinds_are_deduplicated() {
        assert!(NotificationKind::StockOut.is_deduplicated());
        assert!(NotificationKind::LowStock.is_deduplicated());
        assert!(!NotificationKind::OrderConfirmed.is_deduplicated());
        assert!(!NotificationKind::InvoicePaid.is_deduplicated());
        assert!(!NotificationKind::SupplierContacted.is_deduplicated());
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut notification = integration_helpers::notification(NotificationKind::StockOut);
        let first = Utc::now();

        assert!(notification.mark_read(first));
        assert!(!notification.mark_read(Utc::now()));
        assert_eq!(notification.read_at, Some(first));
        assert!(!notification.is_processed);
    }

    #[test]
    fn test_mark_processed_independent_of_read() {
        let mut notification = integration_helpers::notification(NotificationKind::LowStock);

        assert!(notification.mark_processed(Utc::now()));
        assert!(notification.is_processed);
        assert!(!notification.is_read);
        assert!(notification.read_at.is_none());
    }

    #[test]
    fn test_principal_supplier_contacted_first() {
        let mut links = vec![
            integration_helpers::link("cheap", "1.00", false),
            integration_helpers::link("main", "3.00", true),
            integration_helpers::link("mid", "2.00", false),
        ];

        sort_for_contact(&mut links, |l| l);

        let order: Vec<&str> = links.iter().map(|l| l.supplier_id.as_str()).collect();
        assert_eq!(order, vec!["main", "cheap", "mid"]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Exactly one band applies and suppliers are only contacted at zero
        #[test]
        fn prop_contact_only_when_out(quantity in -5i32..200, threshold in 1i32..50) {
            let plan = plan_alerts(quantity, threshold, true);
            prop_assert_eq!(plan.contact_suppliers, quantity <= 0);
            prop_assert_eq!(plan.threshold_alert.is_none(), quantity >= threshold);
        }

        /// Sorted contacts: every principal precedes every non-principal,
        /// and prices ascend within each group
        #[test]
        fn prop_contact_order(entries in prop::collection::vec((0i64..10_000, any::<bool>()), 0..20)) {
            let mut links: Vec<SupplierLink> = entries
                .iter()
                .enumerate()
                .map(|(i, (cents, principal))| {
                    let mut link = integration_helpers::link(&format!("s{}", i), "0", *principal);
                    link.supplier_price = Decimal::new(*cents, 2);
                    link
                })
                .collect();

            sort_for_contact(&mut links, |l| l);

            for pair in links.windows(2) {
                prop_assert!(pair[0].is_principal >= pair[1].is_principal);
                if pair[0].is_principal == pair[1].is_principal {
                    prop_assert!(pair[0].supplier_price <= pair[1].supplier_price);
                }
            }
        }
    }
}

// ============================================================================
// Integration Test Helpers
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    pub fn notification(kind: NotificationKind) -> Notification {
        Notification {
            id: 1,
            kind,
            product_id: 1,
            supplier_id: None,
            title: "Widget".to_string(),
            message: "Widget is out of stock".to_string(),
            is_read: false,
            is_processed: false,
            created_at: Utc::now(),
            read_at: None,
            processed_at: None,
        }
    }

    pub fn link(supplier_id: &str, price: &str, is_principal: bool) -> SupplierLink {
        SupplierLink {
            id: 1,
            product_id: 1,
            supplier_id: supplier_id.to_string(),
            supplier_price: price.parse().unwrap(),
            lead_time_days: shared::DEFAULT_LEAD_TIME_DAYS,
            min_order_quantity: shared::DEFAULT_MIN_ORDER_QUANTITY,
            is_principal,
            created_at: Utc::now(),
        }
    }
}
