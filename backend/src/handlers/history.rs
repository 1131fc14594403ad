//! HTTP handler for deletion history

use axum::{
    extract::{Query, State},
    Json,
};
use shared::{Action, HistoryEntry, Resource};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::audit::HistoryQuery;
use crate::services::AuditService;
use crate::AppState;

pub async fn list_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    user.require(Resource::History, Action::View)?;
    let service = AuditService::new(state.db);
    let entries = service.list(query).await?;
    Ok(Json(entries))
}
