//! HTTP handlers for agent balances

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{Action, AgentBalance, Resource};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::BalanceService;
use crate::AppState;

/// Balance of the calling agent
pub async fn get_my_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<AgentBalance>> {
    user.require(Resource::Balance, Action::View)?;
    let service = BalanceService::new(state.db);
    let balance = service.get_balance(user.user_id()).await?;
    Ok(Json(balance))
}

/// Every agent's balance, largest first
pub async fn list_balances(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<AgentBalance>>> {
    user.require(Resource::Agent, Action::View)?;
    let service = BalanceService::new(state.db);
    let balances = service.list_balances().await?;
    Ok(Json(balances))
}

pub async fn get_agent_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(agent_id): Path<Uuid>,
) -> AppResult<Json<AgentBalance>> {
    if agent_id != user.user_id() {
        user.require(Resource::Agent, Action::View)?;
    }
    user.require(Resource::Balance, Action::View)?;
    let service = BalanceService::new(state.db);
    let balance = service.get_balance(agent_id).await?;
    Ok(Json(balance))
}
