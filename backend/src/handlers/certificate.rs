//! HTTP handlers for certificates

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::certificate::{CertificateRow, IssuanceResponse, VerificationView};
use crate::services::CertificateService;
use crate::AppState;
use shared::types::{Paginated, Pagination};

#[derive(Debug, Deserialize)]
pub struct CertificateListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query parameters for public verification
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// The 8-character code printed on the certificate
    pub code: Option<String>,
}

/// Issue a certificate for an approved application (admin)
pub async fn issue_certificate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(application_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<IssuanceResponse>)> {
    let service = CertificateService::new(state.db.clone(), &state.config);
    let response = service.issue(application_id, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List certificates visible to the caller
pub async fn list_certificates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<CertificateListQuery>,
) -> AppResult<Json<Paginated<CertificateRow>>> {
    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        limit: query.limit.unwrap_or(default.limit).min(100),
    };

    let service = CertificateService::new(state.db.clone(), &state.config);
    let page = service.list(&user, pagination).await?;
    Ok(Json(page))
}

/// Get one certificate
pub async fn get_certificate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CertificateRow>> {
    let service = CertificateService::new(state.db.clone(), &state.config);
    let certificate = service.get(id, &user).await?;
    Ok(Json(certificate))
}

/// Public certificate verification by number and printed code
/// This endpoint is unauthenticated - accessible from the certificate QR code
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_number): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Json<VerificationView>> {
    let code = query.code.ok_or_else(|| {
        AppError::ValidationError("Verification code is required".to_string())
    })?;

    let service = CertificateService::new(state.db.clone(), &state.config);
    let view = service.verify(&certificate_number, &code).await?;
    Ok(Json(view))
}
