//! HTTP handlers for the notification inbox

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{Action, Notification, Resource};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::{NotificationQuery, UnreadCount};
use crate::AppState;

// ============================================================================
// Inbox
// ============================================================================

/// List notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    user.require(Resource::Notification, Action::View)?;
    let notifications = state.notifications().list(query).await?;
    Ok(Json(notifications))
}

pub async fn get_unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    user.require(Resource::Notification, Action::View)?;
    let count = state.notifications().unread_count().await?;
    Ok(Json(count))
}

// ============================================================================
// Flags
// ============================================================================

pub async fn mark_as_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<i64>,
) -> AppResult<Json<Notification>> {
    user.require(Resource::Notification, Action::Edit)?;
    let notification = state.notifications().mark_read(notification_id).await?;
    Ok(Json(notification))
}

/// Marking a stock alert processed lets the next breach raise a new one
pub async fn mark_as_processed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<i64>,
) -> AppResult<Json<Notification>> {
    user.require(Resource::Notification, Action::Edit)?;
    let notification = state
        .notifications()
        .mark_processed(notification_id)
        .await?;
    Ok(Json(notification))
}
