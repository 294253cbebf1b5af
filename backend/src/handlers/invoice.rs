//! HTTP handlers for invoices

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::invoice::InvoiceRow;
use crate::services::InvoiceService;
use crate::AppState;
use shared::models::InvoiceStatus;
use shared::types::{Paginated, Pagination};

/// Query parameters for invoice listing
#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub updated: u64,
}

/// List invoices visible to the caller
pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<Json<Paginated<InvoiceRow>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()
        .map_err(AppError::ValidationError)?;

    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        limit: query.limit.unwrap_or(default.limit).min(100),
    };

    let service = InvoiceService::new(state.db);
    let page = service.list(&user, status, pagination).await?;
    Ok(Json(page))
}

/// Get one invoice
pub async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InvoiceRow>> {
    let service = InvoiceService::new(state.db);
    let invoice = service.get(id, &user).await?;
    Ok(Json(invoice))
}

/// Manually mark an invoice paid (staff)
pub async fn mark_invoice_paid(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MarkPaidRequest>,
) -> AppResult<Json<InvoiceRow>> {
    let service = InvoiceService::new(state.db);
    let invoice = service.mark_paid(id, &user, body.payment_reference).await?;
    Ok(Json(invoice))
}

/// Flip pending invoices past their due date to overdue (staff)
pub async fn overdue_sweep(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<SweepResponse>> {
    let service = InvoiceService::new(state.db);
    let updated = service.overdue_sweep(&user).await?;
    Ok(Json(SweepResponse { updated }))
}
