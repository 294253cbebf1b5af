//! HTTP handlers for public traceability endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::services::traceability::TraceView;
use crate::services::TraceabilityService;
use crate::AppState;

/// Get the public provenance view for a harvest batch by QR token or batch
/// number. This endpoint is unauthenticated - accessible via QR code scan.
pub async fn get_trace_view(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<TraceView>> {
    let service = TraceabilityService::new(state.db);
    let view = service.trace(&code).await?;
    Ok(Json(view))
}
