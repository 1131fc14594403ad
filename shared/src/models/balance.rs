//! Per-agent running total of confirmed sales

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AgentBalance {
    pub agent_id: Uuid,
    pub total: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl AgentBalance {
    pub fn zero(agent_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            total: Decimal::ZERO,
            updated_at: now,
        }
    }

    pub fn add(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.total += amount;
        self.updated_at = now;
    }

    /// Subtract `amount`, never going below zero
    pub fn subtract(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.total = (self.total - amount).max(Decimal::ZERO);
        self.updated_at = now;
    }
}
