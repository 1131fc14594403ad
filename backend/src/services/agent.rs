//! Agent account administration

use std::collections::HashMap;

use serde::Deserialize;
use shared::{validate_password_confirmation, validate_username, AgentGroup, User};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;

const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.full_name, u.is_admin, u.is_active, u.last_login_at, u.created_at";

/// Agent service
#[derive(Clone)]
pub struct AgentService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAgentInput {
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub full_name: Option<String>,
    pub password: String,
    pub password_confirmation: String,
    /// Defaults to read-only when empty
    #[serde(default)]
    pub groups: Vec<AgentGroup>,
}

#[derive(Debug, Deserialize)]
pub struct SetGroupsInput {
    pub groups: Vec<AgentGroup>,
}

/// Groups to store for a requested set: deduplicated, read-only when empty
pub fn effective_groups(requested: &[AgentGroup]) -> Vec<AgentGroup> {
    let mut groups: Vec<AgentGroup> = Vec::with_capacity(requested.len().max(1));
    for group in requested {
        if !groups.contains(group) {
            groups.push(*group);
        }
    }
    if groups.is_empty() {
        groups.push(AgentGroup::DEFAULT);
    }
    groups
}

async fn replace_groups(conn: &mut PgConnection, user_id: Uuid, groups: &[AgentGroup]) -> AppResult<()> {
    sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    for group in groups {
        sqlx::query("INSERT INTO user_groups (user_id, agent_group) VALUES ($1, $2)")
            .bind(user_id)
            .bind(*group)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl AgentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Agent accounts: neither administrators nor supplier dashboard logins
    pub async fn list(&self) -> AppResult<Vec<User>> {
        let mut users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE u.is_admin = FALSE
              AND NOT EXISTS (SELECT 1 FROM suppliers s WHERE s.user_id = u.id)
            ORDER BY u.username
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        let memberships = sqlx::query_as::<_, (Uuid, AgentGroup)>(
            "SELECT user_id, agent_group FROM user_groups ORDER BY agent_group",
        )
        .fetch_all(&self.db)
        .await?;

        let mut by_user: HashMap<Uuid, Vec<AgentGroup>> = HashMap::new();
        for (user_id, group) in memberships {
            by_user.entry(user_id).or_default().push(group);
        }
        for user in &mut users {
            user.groups = by_user.remove(&user.id).unwrap_or_default();
        }

        Ok(users)
    }

    pub async fn create(&self, input: CreateAgentInput) -> AppResult<User> {
        input.validate()?;
        validate_username(&input.username).map_err(|m| AppError::invalid("username", m))?;
        validate_password_confirmation(&input.password, &input.password_confirmation)
            .map_err(|m| AppError::invalid("password", m))?;

        let groups = effective_groups(&input.groups);
        let password_hash = hash_password(&input.password)?;

        let mut tx = self.db.begin().await?;

        let mut user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, full_name, is_admin, is_active, last_login_at, created_at
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "username"))?;

        replace_groups(&mut tx, user.id, &groups).await?;
        tx.commit().await?;

        user.groups = groups;
        tracing::info!(username = %user.username, groups = ?user.groups, "Agent created");
        Ok(user)
    }

    pub async fn set_groups(&self, user_id: Uuid, input: SetGroupsInput) -> AppResult<User> {
        let groups = effective_groups(&input.groups);

        let mut tx = self.db.begin().await?;
        let mut user = self.fetch_staff(&mut tx, user_id).await?;
        replace_groups(&mut tx, user_id, &groups).await?;
        tx.commit().await?;

        user.groups = groups;
        tracing::info!(username = %user.username, groups = ?user.groups, "Agent groups changed");
        Ok(user)
    }

    /// Deactivated agents cannot log in and their refresh tokens are revoked
    pub async fn set_active(&self, user_id: Uuid, active: bool) -> AppResult<User> {
        let mut tx = self.db.begin().await?;
        let mut user = self.fetch_staff(&mut tx, user_id).await?;

        sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(user_id)
            .bind(active)
            .execute(&mut *tx)
            .await?;
        if !active {
            sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        user.groups = sqlx::query_scalar::<_, AgentGroup>(
            "SELECT agent_group FROM user_groups WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        user.is_active = active;
        tracing::info!(username = %user.username, active, "Agent activation changed");
        Ok(user)
    }

    async fn fetch_staff(&self, conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE u.id = $1
              AND u.is_admin = FALSE
              AND NOT EXISTS (SELECT 1 FROM suppliers s WHERE s.user_id = u.id)
            FOR UPDATE
            "#
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Agent".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_groups_default_to_read_only() {
        assert_eq!(effective_groups(&[]), vec![AgentGroup::ReadOnly]);
    }

    #[test]
    fn test_groups_are_deduplicated_in_order() {
        assert_eq!(
            effective_groups(&[
                AgentGroup::OrderManager,
                AgentGroup::SalesAgent,
                AgentGroup::OrderManager
            ]),
            vec![AgentGroup::OrderManager, AgentGroup::SalesAgent]
        );
    }
}
