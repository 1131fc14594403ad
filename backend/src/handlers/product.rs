//! HTTP handlers for the product catalogue and its supplier links

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Action, Resource, SupplierLink};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{OrderQuery, OrderView, PlaceOrderInput};
use crate::services::product::{CreateProductInput, ProductQuery, ProductView, UpdateProductInput};
use crate::services::supplier::{CreateLinkInput, SupplierLinkView};
use crate::services::{ProductService, SupplierService};
use crate::AppState;

/// List products visible to the caller
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<Vec<ProductView>>> {
    user.require(Resource::Product, Action::View)?;
    let service = ProductService::new(state.db);
    let products = service.list(&user.principal, query).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ProductView>> {
    user.require(Resource::Product, Action::View)?;
    let service = ProductService::new(state.db);
    let product = service.get(&user.principal, product_id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductView>)> {
    user.require(Resource::Product, Action::Create)?;
    let service = ProductService::new(state.db);
    let product = service.create(&user.principal, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductView>> {
    user.require(Resource::Product, Action::Edit)?;
    let service = ProductService::new(state.db);
    let product = service.update(&user.principal, product_id, input).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Resource::Product, Action::Delete)?;
    let service = ProductService::new(state.db);
    service.soft_delete(&user.principal, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<ProductView>> {
    user.require(Resource::Product, Action::Delete)?;
    let service = ProductService::new(state.db);
    let product = service.restore(&user.principal, product_id).await?;
    Ok(Json(product))
}

/// Orders placed against one product
pub async fn list_product_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<OrderView>>> {
    user.require(Resource::Order, Action::View)?;
    ProductService::new(state.db.clone())
        .get(&user.principal, product_id)
        .await?;

    let orders = state
        .orders()
        .list(
            &user.principal,
            OrderQuery {
                product_id: Some(product_id),
                ..OrderQuery::default()
            },
        )
        .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct ProductOrderRequest {
    pub quantity: i32,
}

/// Place an order for this product
pub async fn place_product_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
    Json(body): Json<ProductOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderView>)> {
    user.require(Resource::Order, Action::Create)?;
    let order = state
        .orders()
        .place_order(
            &user.principal,
            PlaceOrderInput {
                product_id,
                quantity: body.quantity,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Supplier links in contact order: principal first, then cheapest
pub async fn list_product_suppliers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<SupplierLinkView>>> {
    user.require(Resource::Product, Action::View)?;
    let service = SupplierService::new(state.db);
    let links = service.list_links(&user.principal, product_id).await?;
    Ok(Json(links))
}

pub async fn add_product_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
    Json(input): Json<CreateLinkInput>,
) -> AppResult<(StatusCode, Json<SupplierLink>)> {
    user.require(Resource::Product, Action::Edit)?;
    let service = SupplierService::new(state.db);
    let link = service.add_link(&user.principal, product_id, input).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn remove_product_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((product_id, supplier_id)): Path<(i64, String)>,
) -> AppResult<StatusCode> {
    user.require(Resource::Product, Action::Edit)?;
    let service = SupplierService::new(state.db);
    service
        .remove_link(&user.principal, product_id, &supplier_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
