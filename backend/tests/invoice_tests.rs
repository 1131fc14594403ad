//! Invoice lifecycle tests
//!
//! Property-based and unit tests for:
//! - Status transitions (draft → validated → paid, cancel from anywhere)
//! - Partial payments settling an invoice
//! - Payment confirmation on orders happening once

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{Invoice, InvoiceError, InvoiceStatus, Order, PaymentConfirmation, PaymentStatus};
use uuid::Uuid;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut invoice = integration_helpers::invoice("120.00");

        invoice.transition(InvoiceStatus::Validated).unwrap();
        invoice.transition(InvoiceStatus::Paid).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.remaining_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_draft_cannot_be_paid_directly() {
        let mut invoice = integration_helpers::invoice("10");

        let result = invoice.transition(InvoiceStatus::Paid);

        assert_eq!(
            result,
            Err(InvoiceError::InvalidTransition {
                from: InvoiceStatus::Draft,
                to: InvoiceStatus::Paid
            })
        );
        assert_eq!(invoice.status, InvoiceStatus::Draft);
    }

    #[test]
    fn test_paid_invoice_cannot_return_to_draft() {
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Draft));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Validated));
    }

    #[test]
    fn test_any_status_can_be_cancelled() {
        for status in integration_helpers::ALL_STATUSES {
            assert!(status.can_transition_to(InvoiceStatus::Cancelled));
        }
    }

    #[test]
    fn test_partial_payments_settle_invoice() {
        let mut invoice = integration_helpers::validated("100");

        assert_eq!(invoice.record_payment("40".parse().unwrap()), Ok(false));
        assert_eq!(invoice.status, InvoiceStatus::Validated);
        assert_eq!(invoice.remaining_balance(), "60".parse::<Decimal>().unwrap());

        assert_eq!(invoice.record_payment("60".parse().unwrap()), Ok(true));
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_overpayment_rejected() {
        let mut invoice = integration_helpers::validated("30");

        let result = invoice.record_payment("31".parse().unwrap());

        assert_eq!(
            result,
            Err(InvoiceError::Overpayment {
                remaining: "30".parse().unwrap()
            })
        );
        assert_eq!(invoice.amount_paid, Decimal::ZERO);
    }

    #[test]
    fn test_draft_does_not_accept_payments() {
        let mut invoice = integration_helpers::invoice("30");
        assert_eq!(
            invoice.record_payment(Decimal::ONE),
            Err(InvoiceError::NotPayable(InvoiceStatus::Draft))
        );
    }

    #[test]
    fn test_zero_payment_rejected() {
        let mut invoice = integration_helpers::validated("30");
        assert_eq!(
            invoice.record_payment(Decimal::ZERO),
            Err(InvoiceError::NonPositivePayment)
        );
    }

    #[test]
    fn test_confirm_payment_twice_changes_state_once() {
        let mut order = integration_helpers::order();
        let first = Utc::now();

        assert_eq!(order.confirm_payment(first), PaymentConfirmation::Confirmed);
        assert_eq!(
            order.confirm_payment(Utc::now()),
            PaymentConfirmation::AlreadyConfirmed
        );

        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert!(order.payment_confirmed);
        assert_eq!(order.payment_date, Some(first));
    }

    #[test]
    fn test_only_confirmed_orders_move_balances() {
        let mut order = integration_helpers::order();
        assert_eq!(order.credited_agent(), None);

        order.confirm_payment(Utc::now());
        assert_eq!(order.credited_agent(), order.agent_id);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = InvoiceStatus> {
        prop_oneof![
            Just(InvoiceStatus::Draft),
            Just(InvoiceStatus::Validated),
            Just(InvoiceStatus::Paid),
            Just(InvoiceStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A rejected transition leaves the invoice untouched
        #[test]
        fn prop_rejected_transition_is_noop(from in status_strategy(), to in status_strategy()) {
            let mut invoice = integration_helpers::invoice("50");
            invoice.status = from;
            let before = invoice.clone();

            if invoice.transition(to).is_err() {
                prop_assert_eq!(invoice, before);
            } else {
                prop_assert_eq!(invoice.status, to);
            }
        }

        /// Paid never exceeds total, whatever the payment sequence
        #[test]
        fn prop_amount_paid_bounded(total_cents in 1i64..1_000_000, payments in prop::collection::vec(1i64..500_000, 0..10)) {
            let mut invoice = integration_helpers::validated("0");
            invoice.total_amount = Decimal::new(total_cents, 2);

            for cents in payments {
                let _ = invoice.record_payment(Decimal::new(cents, 2));
                prop_assert!(invoice.amount_paid <= invoice.total_amount);
                prop_assert!(invoice.remaining_balance() >= Decimal::ZERO);
            }
        }

        /// Paying the exact remainder always settles
        #[test]
        fn prop_exact_payment_settles(total_cents in 1i64..1_000_000) {
            let mut invoice = integration_helpers::validated("0");
            invoice.total_amount = Decimal::new(total_cents, 2);

            prop_assert_eq!(invoice.record_payment(invoice.total_amount), Ok(true));
            prop_assert_eq!(invoice.status, InvoiceStatus::Paid);
        }
    }
}

// ============================================================================
// Integration Test Helpers
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    pub const ALL_STATUSES: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Validated,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
    ];

    pub fn invoice(total: &str) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: 1,
            order_id: Some(1),
            total_amount: total.parse().unwrap(),
            amount_paid: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            agent_id: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    pub fn validated(total: &str) -> Invoice {
        let mut invoice = invoice(total);
        invoice.status = InvoiceStatus::Validated;
        invoice
    }

    pub fn order() -> Order {
        Order {
            id: 1,
            product_id: 1,
            quantity: 2,
            unit_price: "7.50".parse().unwrap(),
            agent_id: Some(Uuid::new_v4()),
            payment_status: PaymentStatus::Pending,
            payment_confirmed: false,
            payment_date: None,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }
}
