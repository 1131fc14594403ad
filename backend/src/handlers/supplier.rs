//! HTTP handlers for the supplier directory

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Action, Resource, Supplier};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::supplier::{
    CreateSupplierInput, SetPasswordInput, SupplierQuery, UpdateSupplierInput,
};
use crate::services::SupplierService;
use crate::AppState;

/// List suppliers. Supplier accounts only ever see themselves.
pub async fn list_suppliers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SupplierQuery>,
) -> AppResult<Json<Vec<Supplier>>> {
    user.require(Resource::Supplier, Action::View)?;
    let service = SupplierService::new(state.db);
    if user.principal.is_supplier() {
        let own = service.my_supplier(&user.principal).await?;
        return Ok(Json(vec![own]));
    }
    let suppliers = service.list(query).await?;
    Ok(Json(suppliers))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<String>,
) -> AppResult<Json<Supplier>> {
    user.require(Resource::Supplier, Action::View)?;
    if user.principal.is_supplier() && user.principal.supplier_id.as_deref() != Some(&supplier_id) {
        return Err(AppError::NotFound("Supplier".to_string()));
    }
    let service = SupplierService::new(state.db);
    let supplier = service.get(&supplier_id).await?;
    Ok(Json(supplier))
}

/// Supplier record of the calling dashboard account
pub async fn get_my_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Supplier>> {
    user.require(Resource::Supplier, Action::View)?;
    let service = SupplierService::new(state.db);
    let supplier = service.my_supplier(&user.principal).await?;
    Ok(Json(supplier))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    user.require(Resource::Supplier, Action::Create)?;
    let service = SupplierService::new(state.db);
    let supplier = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<String>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    user.require(Resource::Supplier, Action::Edit)?;
    let service = SupplierService::new(state.db);
    let supplier = service.update(&supplier_id, input).await?;
    Ok(Json(supplier))
}

pub async fn activate_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<String>,
) -> AppResult<Json<Supplier>> {
    user.require(Resource::Supplier, Action::Edit)?;
    let service = SupplierService::new(state.db);
    let supplier = service.set_active(&supplier_id, true).await?;
    Ok(Json(supplier))
}

pub async fn deactivate_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<String>,
) -> AppResult<Json<Supplier>> {
    user.require(Resource::Supplier, Action::Edit)?;
    let service = SupplierService::new(state.db);
    let supplier = service.set_active(&supplier_id, false).await?;
    Ok(Json(supplier))
}

pub async fn set_supplier_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<String>,
    Json(input): Json<SetPasswordInput>,
) -> AppResult<StatusCode> {
    user.require(Resource::Supplier, Action::Edit)?;
    let service = SupplierService::new(state.db);
    service.set_password(&supplier_id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}
