//! HTTP handlers for certification applications

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::application::{
    ApplicationRow, CreateApplicationInput, DashboardStats, ReviewDecisionInput,
    TransitionResponse, UpdateApplicationInput, WorkflowEventResponse,
};
use crate::services::ApplicationService;
use crate::AppState;
use shared::types::{Paginated, Pagination};
use shared::workflow::ApplicationStatus;

/// Query parameters for application listing
#[derive(Debug, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ResubmitRequest {
    pub comment: Option<String>,
}

fn pagination_from(page: Option<u32>, limit: Option<u32>) -> Pagination {
    let default = Pagination::default();
    Pagination {
        page: page.unwrap_or(default.page),
        limit: limit.unwrap_or(default.limit).min(100),
    }
}

/// Create a draft application
pub async fn create_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateApplicationInput>,
) -> AppResult<(StatusCode, Json<ApplicationRow>)> {
    let service = ApplicationService::new(state.db);
    let application = service.create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// List applications visible to the caller
pub async fn list_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ApplicationListQuery>,
) -> AppResult<Json<Paginated<ApplicationRow>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ApplicationStatus>)
        .transpose()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = ApplicationService::new(state.db);
    let page = service
        .list(&user, status, pagination_from(query.page, query.limit))
        .await?;
    Ok(Json(page))
}

/// Staff dashboard statistics
pub async fn application_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    let service = ApplicationService::new(state.db);
    let stats = service.stats(&user).await?;
    Ok(Json(stats))
}

/// Get one application
pub async fn get_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApplicationRow>> {
    let service = ApplicationService::new(state.db);
    let application = service.get(id, &user).await?;
    Ok(Json(application))
}

/// Update an editable application
pub async fn update_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateApplicationInput>,
) -> AppResult<Json<ApplicationRow>> {
    let service = ApplicationService::new(state.db);
    let application = service.update(id, &user, body).await?;
    Ok(Json(application))
}

/// Soft delete a draft application
pub async fn delete_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ApplicationService::new(state.db);
    service.delete_draft(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Farmer confirms the draft, unlocking the phase-1 fee
pub async fn confirm_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransitionResponse>> {
    let service = ApplicationService::new(state.db);
    let response = service.confirm_review(id, &user).await?;
    Ok(Json(response))
}

/// Farmer resubmits after a revision request
pub async fn resubmit_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ResubmitRequest>,
) -> AppResult<Json<TransitionResponse>> {
    let service = ApplicationService::new(state.db);
    let response = service.resubmit(id, &user, body.comment).await?;
    Ok(Json(response))
}

/// Reviewer picks a submitted application up
pub async fn start_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransitionResponse>> {
    let service = ApplicationService::new(state.db);
    let response = service.start_review(id, &user).await?;
    Ok(Json(response))
}

/// Reviewer decision on the documents
pub async fn review_decision(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewDecisionInput>,
) -> AppResult<Json<TransitionResponse>> {
    let service = ApplicationService::new(state.db);
    let response = service.review_decision(id, &user, body).await?;
    Ok(Json(response))
}

/// Workflow history for an application
pub async fn application_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<WorkflowEventResponse>>> {
    let service = ApplicationService::new(state.db);
    let events = service.history(id, &user).await?;
    Ok(Json(events))
}
