//! Role and visibility tests
//!
//! Property-based and unit tests for:
//! - Role resolution by priority
//! - Permission table consistency
//! - Record scope per role and resource (out-of-scope records are invisible)

use proptest::prelude::*;
use shared::{
    validate_permission_table, Action, AgentGroup, InvoiceStatus, Principal, Resource, Role,
    Scope,
};
use uuid::Uuid;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_permission_table_is_consistent() {
        assert_eq!(validate_permission_table(), Ok(()));
    }

    #[test]
    fn test_admin_flag_beats_groups() {
        let principal = integration_helpers::agent(true, &[AgentGroup::ReadOnly]);
        assert_eq!(principal.role(), Some(Role::Administrator));
    }

    #[test]
    fn test_highest_group_wins() {
        let principal = integration_helpers::agent(
            false,
            &[AgentGroup::ReadOnly, AgentGroup::InvoiceManager, AgentGroup::OrderManager],
        );
        assert_eq!(principal.role(), Some(Role::OrderManager));
    }

    #[test]
    fn test_groups_beat_supplier_link() {
        let mut principal = integration_helpers::agent(false, &[AgentGroup::SalesAgent]);
        principal.supplier_id = Some("acme".to_string());
        assert_eq!(principal.role(), Some(Role::SalesAgent));
        assert!(!principal.is_supplier());
    }

    #[test]
    fn test_account_without_role_can_do_nothing() {
        let principal = integration_helpers::agent(false, &[]);
        assert_eq!(principal.role(), None);
        for resource in Resource::ALL {
            for action in Action::ALL {
                assert!(!principal.can(resource, action));
            }
        }
    }

    #[test]
    fn test_supplier_sees_only_own_records() {
        let supplier = integration_helpers::supplier("acme");
        let scope = supplier.record_scope(Resource::Order);

        assert_eq!(scope, Scope::Supplier("acme".to_string()));
        assert!(scope.admits(Some("acme"), None));
        assert!(!scope.admits(Some("globex"), None));
        assert!(!scope.admits(None, Some(supplier.user_id)));
    }

    #[test]
    fn test_sales_agents_see_what_they_created() {
        let agent = integration_helpers::agent(false, &[AgentGroup::SalesAgent]);

        for resource in [Resource::Order, Resource::Invoice] {
            let scope = agent.record_scope(resource);
            assert!(scope.admits(None, Some(agent.user_id)));
            assert!(!scope.admits(None, Some(Uuid::new_v4())));
            assert!(!scope.admits(None, None));
        }
    }

    #[test]
    fn test_invoice_manager_reaches_orders_placed_by_others() {
        let invoicer = integration_helpers::agent(false, &[AgentGroup::InvoiceManager]);
        let seller = Uuid::new_v4();

        assert!(invoicer.can(Resource::Invoice, Action::Create));
        assert!(!invoicer.can(Resource::Order, Action::Create));
        assert_eq!(invoicer.record_scope(Resource::Order), Scope::All);
        assert!(invoicer.record_scope(Resource::Order).admits(None, Some(seller)));
        assert_eq!(invoicer.record_scope(Resource::Invoice), Scope::All);
    }

    #[test]
    fn test_managers_see_the_records_they_manage() {
        let stock = integration_helpers::agent(false, &[AgentGroup::StockManager]);
        assert_eq!(stock.record_scope(Resource::Order), Scope::All);
        assert_eq!(stock.record_scope(Resource::Invoice), Scope::All);

        let orders = integration_helpers::agent(false, &[AgentGroup::OrderManager]);
        assert_eq!(orders.record_scope(Resource::Order), Scope::All);
        assert_eq!(
            orders.record_scope(Resource::Invoice),
            Scope::Agent(orders.user_id)
        );
    }

    #[test]
    fn test_read_only_sees_own_records() {
        let reader = integration_helpers::agent(false, &[AgentGroup::ReadOnly]);
        assert_eq!(reader.record_scope(Resource::Order), Scope::Agent(reader.user_id));
        assert_eq!(reader.record_scope(Resource::Invoice), Scope::Agent(reader.user_id));
    }

    #[test]
    fn test_admin_sees_everything() {
        let admin = integration_helpers::agent(true, &[]);
        assert_eq!(admin.record_scope(Resource::Invoice), Scope::All);
        assert!(admin.record_scope(Resource::Order).admits(None, None));
    }

    #[test]
    fn test_agents_see_the_whole_catalogue() {
        let agent = integration_helpers::agent(false, &[AgentGroup::SalesAgent]);
        assert_eq!(agent.product_scope(), Scope::All);

        let supplier = integration_helpers::supplier("acme");
        assert_eq!(supplier.product_scope(), Scope::Supplier("acme".to_string()));
    }

    #[test]
    fn test_only_admin_and_supplier_confirm_payment() {
        for role in Role::ALL {
            let expected = matches!(role, Role::Administrator | Role::Supplier);
            assert_eq!(role.allows(Resource::Order, Action::Confirm), expected, "{:?}", role);
        }
    }

    #[test]
    fn test_invoice_status_rights() {
        let manager = integration_helpers::agent(false, &[AgentGroup::StockManager]);
        let invoicer = integration_helpers::agent(false, &[AgentGroup::InvoiceManager]);
        let supplier = integration_helpers::supplier("acme");

        assert!(manager.may_set_invoice_status(InvoiceStatus::Validated));
        assert!(!invoicer.may_set_invoice_status(InvoiceStatus::Validated));
        assert!(supplier.may_set_invoice_status(InvoiceStatus::Paid));
        assert!(!supplier.may_set_invoice_status(InvoiceStatus::Cancelled));
    }

    #[test]
    fn test_read_only_cannot_write() {
        let principal = integration_helpers::agent(false, &[AgentGroup::ReadOnly]);
        for resource in Resource::ALL {
            assert!(!principal.can(resource, Action::Create));
            assert!(!principal.can(resource, Action::Edit));
            assert!(!principal.can(resource, Action::Delete));
        }
    }

    #[test]
    fn test_agent_administration_is_admin_only() {
        for role in Role::ALL {
            if role != Role::Administrator {
                assert!(!role.allows(Resource::Agent, Action::View), "{:?}", role);
            }
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn own_records_group_strategy() -> impl Strategy<Value = AgentGroup> {
        prop_oneof![Just(AgentGroup::SalesAgent), Just(AgentGroup::ReadOnly)]
    }

    fn group_strategy() -> impl Strategy<Value = AgentGroup> {
        prop_oneof![
            Just(AgentGroup::StockManager),
            Just(AgentGroup::OrderManager),
            Just(AgentGroup::InvoiceManager),
            Just(AgentGroup::SalesAgent),
            Just(AgentGroup::ReadOnly),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The resolved role is the highest-priority group held
        #[test]
        fn prop_role_is_minimum_group(groups in prop::collection::vec(group_strategy(), 1..6)) {
            let principal = integration_helpers::agent(false, &groups);
            let expected = groups.iter().map(|g| Role::from(*g)).min();
            prop_assert_eq!(principal.role(), expected);
        }

        /// Group order never changes the outcome
        #[test]
        fn prop_role_ignores_group_order(groups in prop::collection::vec(group_strategy(), 1..6)) {
            let forward = integration_helpers::agent(false, &groups);
            let mut reversed_groups = groups.clone();
            reversed_groups.reverse();
            let reversed = integration_helpers::agent(false, &reversed_groups);
            prop_assert_eq!(forward.role(), reversed.role());
        }

        /// Sales and read-only agents never see another agent's records
        #[test]
        fn prop_agent_scope_excludes_others(groups in prop::collection::vec(own_records_group_strategy(), 1..4)) {
            let principal = integration_helpers::agent(false, &groups);
            prop_assert!(!principal.record_scope(Resource::Order).admits(None, Some(Uuid::new_v4())));
            prop_assert!(!principal.record_scope(Resource::Invoice).admits(None, Some(Uuid::new_v4())));
        }

        /// Holding full rights on a resource means seeing all of it
        #[test]
        fn prop_managed_resources_are_fully_visible(groups in prop::collection::vec(group_strategy(), 1..4)) {
            let principal = integration_helpers::agent(false, &groups);
            for resource in [Resource::Order, Resource::Invoice] {
                if principal.manages(resource) {
                    prop_assert_eq!(principal.record_scope(resource), Scope::All);
                }
            }
        }

        /// A role that can do anything to a resource can view it
        #[test]
        fn prop_any_grant_implies_view(role_index in 0usize..7) {
            let role = Role::ALL[role_index];
            for resource in Resource::ALL {
                let any = Action::ALL.iter().any(|a| role.allows(resource, *a));
                if any {
                    prop_assert!(role.allows(resource, Action::View));
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

    pub fn agent(is_admin: bool, groups: &[AgentGroup]) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            is_admin,
            groups: groups.to_vec(),
            supplier_id: None,
        }
    }

    pub fn supplier(code: &str) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            is_admin: false,
            groups: Vec::new(),
            supplier_id: Some(code.to_string()),
        }
    }
}
