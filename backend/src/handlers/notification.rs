//! HTTP handlers for in-app notifications

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::NotificationResponse;
use crate::services::NotificationService;
use crate::AppState;
use shared::types::{Paginated, Pagination};

#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

/// List notifications for the caller
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotificationListQuery>,
) -> AppResult<Json<Paginated<NotificationResponse>>> {
    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        limit: query.limit.unwrap_or(default.limit).min(100),
    };

    let service = NotificationService::new(state.db);
    let page = service.list(user.user_id, pagination).await?;
    Ok(Json(page))
}

/// Unread notification count
pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.db);
    let unread = service.unread_count(user.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark one notification as read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = NotificationService::new(state.db);
    service.mark_read(id, user.user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Mark all notifications as read
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let service = NotificationService::new(state.db);
    let marked = service.mark_all_read(user.user_id).await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
