//! HTTP handlers for on-site audits

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::audit::{AuditResultInput, AuditRow, ScheduleAuditInput, WorklistEntry};
use crate::services::AuditService;
use crate::AppState;
use shared::types::{Paginated, Pagination};

#[derive(Debug, Deserialize)]
pub struct WorklistQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Schedule an on-site audit (reviewer/admin)
pub async fn schedule_audit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ScheduleAuditInput>,
) -> AppResult<(StatusCode, Json<AuditRow>)> {
    let service = AuditService::new(state.db);
    let audit = service.schedule(&user, body).await?;
    Ok((StatusCode::CREATED, Json(audit)))
}

/// Open audits assigned to the calling auditor
pub async fn audit_worklist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<WorklistQuery>,
) -> AppResult<Json<Paginated<WorklistEntry>>> {
    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        limit: query.limit.unwrap_or(default.limit).min(100),
    };

    let service = AuditService::new(state.db);
    let page = service.worklist(&user, pagination).await?;
    Ok(Json(page))
}

/// Auditor starts the on-site audit
pub async fn start_audit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(application_id): Path<Uuid>,
) -> AppResult<Json<AuditRow>> {
    let service = AuditService::new(state.db);
    let audit = service.start(application_id, &user).await?;
    Ok(Json(audit))
}

/// Auditor submits the audit result
pub async fn submit_audit_result(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(application_id): Path<Uuid>,
    Json(body): Json<AuditResultInput>,
) -> AppResult<Json<AuditRow>> {
    let service = AuditService::new(state.db);
    let audit = service.submit_result(application_id, &user, body).await?;
    Ok(Json(audit))
}
