//! HTTP handlers for invoices

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Action, Resource};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::invoice::{
    CreateInvoiceInput, InvoiceQuery, InvoiceView, RecordPaymentInput, UpdateStatusInput,
};
use crate::AppState;

pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Json<Vec<InvoiceView>>> {
    user.require(Resource::Invoice, Action::View)?;
    if query.deleted {
        user.require(Resource::Invoice, Action::Delete)?;
    }
    let invoices = state.invoices().list(&user.principal, query).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<i64>,
) -> AppResult<Json<InvoiceView>> {
    user.require(Resource::Invoice, Action::View)?;
    let invoice = state.invoices().get(&user.principal, invoice_id).await?;
    Ok(Json(invoice))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<(StatusCode, Json<InvoiceView>)> {
    user.require(Resource::Invoice, Action::Create)?;
    let invoice = state.invoices().create(&user.principal, input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Status changes carry an extra role check inside the service
pub async fn update_invoice_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<i64>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<InvoiceView>> {
    user.require(Resource::Invoice, Action::Edit)?;
    let invoice = state
        .invoices()
        .update_status(&user.principal, invoice_id, input)
        .await?;
    Ok(Json(invoice))
}

pub async fn record_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<i64>,
    Json(input): Json<RecordPaymentInput>,
) -> AppResult<Json<InvoiceView>> {
    user.require(Resource::Invoice, Action::Edit)?;
    let invoice = state
        .invoices()
        .record_payment(&user.principal, invoice_id, input)
        .await?;
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Resource::Invoice, Action::Delete)?;
    state
        .invoices()
        .soft_delete(&user.principal, invoice_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<i64>,
) -> AppResult<Json<InvoiceView>> {
    user.require(Resource::Invoice, Action::Delete)?;
    let invoice = state
        .invoices()
        .restore(&user.principal, invoice_id)
        .await?;
    Ok(Json(invoice))
}
