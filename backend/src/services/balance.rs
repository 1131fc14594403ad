//! Agent balance ledger

use chrono::Utc;
use rust_decimal::Decimal;
use shared::AgentBalance;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMovement {
    Credit,
    Debit,
}

/// Apply a movement to an agent's balance inside the caller's transaction.
///
/// The balance row is created at zero on first use and locked for the
/// duration of the transaction. Debits never take the total below zero.
pub async fn apply_movement(
    conn: &mut PgConnection,
    agent_id: Uuid,
    amount: Decimal,
    movement: BalanceMovement,
) -> AppResult<AgentBalance> {
    if amount < Decimal::ZERO {
        return Err(AppError::invalid("amount", "Amount cannot be negative"));
    }

    sqlx::query("INSERT INTO agent_balances (agent_id) VALUES ($1) ON CONFLICT (agent_id) DO NOTHING")
        .bind(agent_id)
        .execute(&mut *conn)
        .await?;

    let mut balance = sqlx::query_as::<_, AgentBalance>(
        "SELECT agent_id, total, updated_at FROM agent_balances WHERE agent_id = $1 FOR UPDATE",
    )
    .bind(agent_id)
    .fetch_one(&mut *conn)
    .await?;

    let now = Utc::now();
    match movement {
        BalanceMovement::Credit => balance.add(amount, now),
        BalanceMovement::Debit => balance.subtract(amount, now),
    }

    sqlx::query("UPDATE agent_balances SET total = $2, updated_at = $3 WHERE agent_id = $1")
        .bind(agent_id)
        .bind(balance.total)
        .bind(balance.updated_at)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(%agent_id, ?movement, %amount, total = %balance.total, "Agent balance updated");

    Ok(balance)
}

/// Read access to agent balances
#[derive(Clone)]
pub struct BalanceService {
    db: PgPool,
}

impl BalanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Balance of one agent, zero if nothing was ever credited
    pub async fn get_balance(&self, agent_id: Uuid) -> AppResult<AgentBalance> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(agent_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Agent".to_string()));
        }

        let balance = sqlx::query_as::<_, AgentBalance>(
            r#"
            INSERT INTO agent_balances (agent_id) VALUES ($1)
            ON CONFLICT (agent_id) DO UPDATE SET agent_id = EXCLUDED.agent_id
            RETURNING agent_id, total, updated_at
            "#,
        )
        .bind(agent_id)
        .fetch_one(&self.db)
        .await?;

        Ok(balance)
    }

    /// All balances, largest first
    pub async fn list_balances(&self) -> AppResult<Vec<AgentBalance>> {
        let balances = sqlx::query_as::<_, AgentBalance>(
            "SELECT agent_id, total, updated_at FROM agent_balances ORDER BY total DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(balances)
    }
}
