//! HTTP handlers for agent administration

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Action, Resource, User};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::agent::{CreateAgentInput, SetGroupsInput};
use crate::services::AgentService;
use crate::AppState;

pub async fn list_agents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    user.require(Resource::Agent, Action::View)?;
    let service = AgentService::new(state.db);
    let agents = service.list().await?;
    Ok(Json(agents))
}

pub async fn create_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateAgentInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    user.require(Resource::Agent, Action::Create)?;
    let service = AgentService::new(state.db);
    let agent = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// Replace an agent's group memberships
pub async fn set_agent_groups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(agent_id): Path<Uuid>,
    Json(input): Json<SetGroupsInput>,
) -> AppResult<Json<User>> {
    user.require(Resource::Agent, Action::Edit)?;
    let service = AgentService::new(state.db);
    let agent = service.set_groups(agent_id, input).await?;
    Ok(Json(agent))
}

pub async fn activate_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(agent_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    user.require(Resource::Agent, Action::Edit)?;
    let service = AgentService::new(state.db);
    let agent = service.set_active(agent_id, true).await?;
    Ok(Json(agent))
}

pub async fn deactivate_agent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(agent_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    user.require(Resource::Agent, Action::Edit)?;
    let service = AgentService::new(state.db);
    let agent = service.set_active(agent_id, false).await?;
    Ok(Json(agent))
}
