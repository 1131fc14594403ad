//! Roles, the permission table and record visibility
//!
//! A principal resolves to exactly one [`Role`], taken by priority from its
//! admin flag, its agent groups and its supplier link. Roles map to a static
//! `Resource × Action` table. Visibility is a separate concern expressed as a
//! [`Scope`] that the backend turns into query filters.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{AgentGroup, InvoiceStatus};

/// Effective role, in descending priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    StockManager,
    OrderManager,
    InvoiceManager,
    SalesAgent,
    ReadOnly,
    Supplier,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Administrator,
        Role::StockManager,
        Role::OrderManager,
        Role::InvoiceManager,
        Role::SalesAgent,
        Role::ReadOnly,
        Role::Supplier,
    ];

    pub fn allows(self, resource: Resource, action: Action) -> bool {
        role_permissions(self)
            .iter()
            .any(|p| p.resource == resource && p.actions.contains(&action))
    }
}

impl From<AgentGroup> for Role {
    fn from(group: AgentGroup) -> Self {
        match group {
            AgentGroup::StockManager => Role::StockManager,
            AgentGroup::OrderManager => Role::OrderManager,
            AgentGroup::InvoiceManager => Role::InvoiceManager,
            AgentGroup::SalesAgent => Role::SalesAgent,
            AgentGroup::ReadOnly => Role::ReadOnly,
        }
    }
}

/// Resources that can be accessed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Product,
    Order,
    Invoice,
    Supplier,
    Notification,
    History,
    Agent,
    Balance,
}

impl Resource {
    pub const ALL: [Resource; 8] = [
        Resource::Product,
        Resource::Order,
        Resource::Invoice,
        Resource::Supplier,
        Resource::Notification,
        Resource::History,
        Resource::Agent,
        Resource::Balance,
    ];
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    /// Confirm payment on an order
    Confirm,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Confirm,
    ];
}

/// Actions granted on one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub actions: &'static [Action],
}

const VIEW: &[Action] = &[Action::View];
const VIEW_EDIT: &[Action] = &[Action::View, Action::Edit];
const VIEW_CREATE: &[Action] = &[Action::View, Action::Create];
const CRUD: &[Action] = &[Action::View, Action::Create, Action::Edit, Action::Delete];
const VIEW_CONFIRM: &[Action] = &[Action::View, Action::Confirm];
const EVERYTHING: &[Action] = &Action::ALL;

const fn grant(resource: Resource, actions: &'static [Action]) -> Permission {
    Permission { resource, actions }
}

static ADMINISTRATOR: [Permission; 8] = [
    grant(Resource::Product, EVERYTHING),
    grant(Resource::Order, EVERYTHING),
    grant(Resource::Invoice, EVERYTHING),
    grant(Resource::Supplier, EVERYTHING),
    grant(Resource::Notification, EVERYTHING),
    grant(Resource::History, EVERYTHING),
    grant(Resource::Agent, EVERYTHING),
    grant(Resource::Balance, EVERYTHING),
];

static STOCK_MANAGER: [Permission; 7] = [
    grant(Resource::Product, CRUD),
    grant(Resource::Order, CRUD),
    grant(Resource::Invoice, CRUD),
    grant(Resource::Supplier, VIEW),
    grant(Resource::Notification, VIEW_EDIT),
    grant(Resource::History, VIEW),
    grant(Resource::Balance, VIEW),
];

static ORDER_MANAGER: [Permission; 4] = [
    grant(Resource::Product, VIEW),
    grant(Resource::Order, CRUD),
    grant(Resource::Invoice, VIEW),
    grant(Resource::Balance, VIEW),
];

static INVOICE_MANAGER: [Permission; 4] = [
    grant(Resource::Product, VIEW),
    grant(Resource::Order, VIEW),
    grant(Resource::Invoice, CRUD),
    grant(Resource::Balance, VIEW),
];

static SALES_AGENT: [Permission; 5] = [
    grant(Resource::Product, VIEW),
    grant(Resource::Order, VIEW_CREATE),
    grant(Resource::Invoice, VIEW),
    grant(Resource::Supplier, VIEW),
    grant(Resource::Balance, VIEW),
];

static READ_ONLY: [Permission; 6] = [
    grant(Resource::Product, VIEW),
    grant(Resource::Order, VIEW),
    grant(Resource::Invoice, VIEW),
    grant(Resource::Supplier, VIEW),
    grant(Resource::History, VIEW),
    grant(Resource::Balance, VIEW),
];

static SUPPLIER: [Permission; 4] = [
    grant(Resource::Product, CRUD),
    grant(Resource::Order, VIEW_CONFIRM),
    grant(Resource::Invoice, VIEW_EDIT),
    grant(Resource::Supplier, VIEW),
];

/// Permission table row for a role
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Administrator => &ADMINISTRATOR,
        Role::StockManager => &STOCK_MANAGER,
        Role::OrderManager => &ORDER_MANAGER,
        Role::InvoiceManager => &INVOICE_MANAGER,
        Role::SalesAgent => &SALES_AGENT,
        Role::ReadOnly => &READ_ONLY,
        Role::Supplier => &SUPPLIER,
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionTableError {
    #[error("{role:?} lists {resource:?} more than once")]
    DuplicateResource { role: Role, resource: Resource },

    #[error("{role:?} may {action:?} {resource:?} without viewing it")]
    MissingView {
        role: Role,
        resource: Resource,
        action: Action,
    },

    #[error("administrator lacks {action:?} on {resource:?}")]
    IncompleteAdministrator { resource: Resource, action: Action },
}

/// Check the permission table for internal consistency. Run once at startup.
pub fn validate_permission_table() -> Result<(), PermissionTableError> {
    for role in Role::ALL {
        let row = role_permissions(role);
        for (i, permission) in row.iter().enumerate() {
            if row[..i].iter().any(|p| p.resource == permission.resource) {
                return Err(PermissionTableError::DuplicateResource {
                    role,
                    resource: permission.resource,
                });
            }
            if let Some(&action) = permission.actions.iter().find(|a| **a != Action::View) {
                if !permission.actions.contains(&Action::View) {
                    return Err(PermissionTableError::MissingView {
                        role,
                        resource: permission.resource,
                        action,
                    });
                }
            }
        }
    }

    for resource in Resource::ALL {
        for action in Action::ALL {
            if !Role::Administrator.allows(resource, action) {
                return Err(PermissionTableError::IncompleteAdministrator { resource, action });
            }
        }
    }

    Ok(())
}

/// Which rows of orders, invoices or products a principal may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Records whose product belongs to this supplier
    Supplier(String),
    /// Records created by this agent
    Agent(Uuid),
}

impl Scope {
    pub fn supplier_filter(&self) -> Option<&str> {
        match self {
            Scope::Supplier(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn agent_filter(&self) -> Option<Uuid> {
        match self {
            Scope::Agent(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether a record owned by `supplier_id` and created by `agent_id` is visible
    pub fn admits(&self, supplier_id: Option<&str>, agent_id: Option<Uuid>) -> bool {
        match self {
            Scope::All => true,
            Scope::Supplier(own) => supplier_id == Some(own.as_str()),
            Scope::Agent(own) => agent_id == Some(*own),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub is_admin: bool,
    pub groups: Vec<AgentGroup>,
    pub supplier_id: Option<String>,
}

impl Principal {
    /// Highest-priority role, or `None` for an account with no role at all
    pub fn role(&self) -> Option<Role> {
        if self.is_admin {
            return Some(Role::Administrator);
        }
        if let Some(role) = self.groups.iter().map(|g| Role::from(*g)).min() {
            return Some(role);
        }
        self.supplier_id.as_ref().map(|_| Role::Supplier)
    }

    pub fn can(&self, resource: Resource, action: Action) -> bool {
        self.role().is_some_and(|role| role.allows(resource, action))
    }

    pub fn is_supplier(&self) -> bool {
        self.role() == Some(Role::Supplier)
    }

    /// Products: suppliers see their own, everyone else sees all
    pub fn product_scope(&self) -> Scope {
        match (self.role(), &self.supplier_id) {
            (Some(Role::Supplier), Some(id)) => Scope::Supplier(id.clone()),
            _ => Scope::All,
        }
    }

    /// Whether the role may create, edit and delete `resource`
    pub fn manages(&self, resource: Resource) -> bool {
        [Action::Create, Action::Edit, Action::Delete]
            .iter()
            .all(|action| self.can(resource, *action))
    }

    /// Orders or invoices visible to the principal
    ///
    /// Administrators see all and suppliers see those on their products.
    /// Agents that manage a resource see all of it, and invoicing agents see
    /// every order since any of them may need an invoice. Other agents see
    /// the records they created.
    pub fn record_scope(&self, resource: Resource) -> Scope {
        match (self.role(), &self.supplier_id) {
            (Some(Role::Administrator), _) => Scope::All,
            (Some(Role::Supplier), Some(id)) => Scope::Supplier(id.clone()),
            _ if self.manages(resource) => Scope::All,
            _ if resource == Resource::Order && self.can(Resource::Invoice, Action::Create) => Scope::All,
            _ => Scope::Agent(self.user_id),
        }
    }

    /// Invoice status changes and invoice deletion
    pub fn may_manage_invoices(&self) -> bool {
        matches!(
            self.role(),
            Some(Role::Administrator) | Some(Role::StockManager)
        )
    }

    /// Suppliers may only settle their own invoices; managers may do any move
    pub fn may_set_invoice_status(&self, next: InvoiceStatus) -> bool {
        self.may_manage_invoices() || (next == InvoiceStatus::Paid && self.is_supplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        assert_eq!(validate_permission_table(), Ok(()));
    }

    #[test]
    fn test_admin_wins_over_groups() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            is_admin: true,
            groups: vec![AgentGroup::ReadOnly],
            supplier_id: Some("acme".into()),
        };
        assert_eq!(principal.role(), Some(Role::Administrator));
        assert_eq!(principal.record_scope(Resource::Order), Scope::All);
    }
}
