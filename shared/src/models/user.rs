//! User accounts and agent groups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff groups an agent account can belong to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "agent_group", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AgentGroup {
    StockManager,
    OrderManager,
    InvoiceManager,
    SalesAgent,
    ReadOnly,
}

impl AgentGroup {
    /// Group given to agents created without an explicit group
    pub const DEFAULT: AgentGroup = AgentGroup::ReadOnly;
}

/// A user account. Password hashes never leave the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub groups: Vec<AgentGroup>,
}
