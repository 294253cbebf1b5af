//! HTTP handlers for the payment gateway webhook and status polling

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::payment::{PaymentStatusView, PaymentWebhookPayload, WebhookAck};
use crate::services::PaymentService;
use crate::AppState;

/// Payment gateway callback
/// This endpoint is unauthenticated; the payload carries its own HMAC signature
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhookPayload>,
) -> AppResult<Json<WebhookAck>> {
    let service = PaymentService::new(state.db.clone(), &state.config);
    let ack = service.handle_webhook(payload).await?;
    Ok(Json(ack))
}

/// Payment status polling for an invoice
pub async fn payment_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<PaymentStatusView>> {
    let service = PaymentService::new(state.db.clone(), &state.config);
    let view = service.status(invoice_id, &user).await?;
    Ok(Json(view))
}
