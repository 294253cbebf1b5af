//! HTTP handlers for quotes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::invoice::SweepResponse;
use crate::middleware::CurrentUser;
use crate::services::quote::{AcceptQuoteResponse, CreateQuoteInput, QuoteRow};
use crate::services::QuoteService;
use crate::AppState;
use shared::types::{Paginated, Pagination};

#[derive(Debug, Deserialize)]
pub struct QuoteListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Create a draft quote (staff)
pub async fn create_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateQuoteInput>,
) -> AppResult<(StatusCode, Json<QuoteRow>)> {
    let service = QuoteService::new(state.db);
    let quote = service.create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// List quotes visible to the caller
pub async fn list_quotes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<QuoteListQuery>,
) -> AppResult<Json<Paginated<QuoteRow>>> {
    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        limit: query.limit.unwrap_or(default.limit).min(100),
    };

    let service = QuoteService::new(state.db);
    let page = service.list(&user, pagination).await?;
    Ok(Json(page))
}

/// Get one quote
pub async fn get_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QuoteRow>> {
    let service = QuoteService::new(state.db);
    let quote = service.get(id, &user).await?;
    Ok(Json(quote))
}

/// Send a draft quote to the farmer (staff)
pub async fn send_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QuoteRow>> {
    let service = QuoteService::new(state.db);
    let quote = service.send(id, &user).await?;
    Ok(Json(quote))
}

/// Farmer accepts a quote; the invoice is created in the same transaction
pub async fn accept_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AcceptQuoteResponse>> {
    let service = QuoteService::new(state.db);
    let response = service.accept(id, &user).await?;
    Ok(Json(response))
}

/// Farmer rejects a quote
pub async fn reject_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QuoteRow>> {
    let service = QuoteService::new(state.db);
    let quote = service.reject(id, &user).await?;
    Ok(Json(quote))
}

/// Expire sent quotes past their valid-until date (staff)
pub async fn expire_quotes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<SweepResponse>> {
    let service = QuoteService::new(state.db);
    let updated = service.expire_sweep(&user).await?;
    Ok(Json(SweepResponse { updated }))
}
