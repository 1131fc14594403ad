//! HTTP handlers for orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Action, Resource};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{
    OrderQuery, OrderView, PaymentConfirmationView, PlaceOrderInput, UpdateOrderInput,
};
use crate::AppState;

/// List orders. `?deleted=true` lists the bin and needs delete rights.
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<OrderView>>> {
    user.require(Resource::Order, Action::View)?;
    if query.deleted {
        user.require(Resource::Order, Action::Delete)?;
    }
    let orders = state.orders().list(&user.principal, query).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<OrderView>> {
    user.require(Resource::Order, Action::View)?;
    let order = state.orders().get(&user.principal, order_id).await?;
    Ok(Json(order))
}

pub async fn place_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<PlaceOrderInput>,
) -> AppResult<(StatusCode, Json<OrderView>)> {
    user.require(Resource::Order, Action::Create)?;
    let order = state.orders().place_order(&user.principal, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderView>> {
    user.require(Resource::Order, Action::Edit)?;
    let order = state
        .orders()
        .update(&user.principal, order_id, input)
        .await?;
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Resource::Order, Action::Delete)?;
    state.orders().delete(&user.principal, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<OrderView>> {
    user.require(Resource::Order, Action::Delete)?;
    let order = state.orders().restore(&user.principal, order_id).await?;
    Ok(Json(order))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<PaymentConfirmationView>> {
    user.require(Resource::Order, Action::Confirm)?;
    let confirmation = state
        .orders()
        .confirm_payment(&user.principal, order_id)
        .await?;
    Ok(Json(confirmation))
}
