//! Payment gateway webhook processing
//!
//! The gateway signs each callback with HMAC-SHA256 over the canonical string
//! `transaction_ref|invoice_number|amount|status`, base64-encoded. Callbacks
//! are idempotent on the gateway transaction reference: a replay is
//! acknowledged without re-running any side effect.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::invoice::settle_invoice_tx;
use shared::signing::{canonical_payload, verify_signature};
use shared::workflow::ActorRole;

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
    webhook_secret: String,
}

/// Gateway callback payload
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookPayload {
    /// Gateway-side transaction reference, unique per payment attempt
    pub transaction_ref: String,
    pub invoice_number: String,
    pub amount: Decimal,
    /// Gateway payment status: "success" or "failed"
    pub status: String,
    /// base64 HMAC-SHA256 signature
    pub signature: String,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    /// True when this transaction reference was already processed
    pub duplicate: bool,
    pub invoice_number: String,
}

/// Payment status view for polling
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentStatusView {
    pub invoice_number: String,
    pub invoice_status: String,
    pub total: Decimal,
    pub transaction_ref: Option<String>,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PaymentService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            webhook_secret: config.payment.webhook_secret.clone(),
        }
    }

    /// Process a gateway callback
    pub async fn handle_webhook(&self, payload: PaymentWebhookPayload) -> AppResult<WebhookAck> {
        let canonical = canonical_payload(
            &payload.transaction_ref,
            &payload.invoice_number,
            &payload.amount,
            &payload.status,
        );

        if !verify_signature(&self.webhook_secret, &canonical, &payload.signature) {
            tracing::warn!(
                transaction_ref = %payload.transaction_ref,
                "webhook signature verification failed"
            );
            return Err(AppError::InvalidWebhookSignature);
        }

        let mut tx = self.db.begin().await?;

        // Look the invoice up first so failed attempts can be recorded against it
        let invoice_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM invoices WHERE invoice_number = $1",
        )
        .bind(&payload.invoice_number)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        // Idempotency gate: the transaction reference is unique
        let inserted = sqlx::query(
            r#"
            INSERT INTO payment_transactions (transaction_ref, invoice_id, amount, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (transaction_ref) DO NOTHING
            "#,
        )
        .bind(&payload.transaction_ref)
        .bind(invoice_id)
        .bind(payload.amount)
        .bind(&payload.status)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.commit().await?;
            tracing::info!(
                transaction_ref = %payload.transaction_ref,
                "duplicate webhook acknowledged"
            );
            return Ok(WebhookAck {
                received: true,
                duplicate: true,
                invoice_number: payload.invoice_number,
            });
        }

        if payload.status != "success" {
            // Recorded for audit, nothing else to do
            tx.commit().await?;
            return Ok(WebhookAck {
                received: true,
                duplicate: false,
                invoice_number: payload.invoice_number,
            });
        }

        // Amount must match the invoice total exactly
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT total FROM invoices WHERE id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        if total != payload.amount {
            return Err(AppError::PaymentError(format!(
                "Amount {} does not match invoice total {}",
                payload.amount, total
            )));
        }

        settle_invoice_tx(
            &mut tx,
            invoice_id,
            &payload.transaction_ref,
            None,
            ActorRole::System,
        )
        .await?;

        tx.commit().await?;

        Ok(WebhookAck {
            received: true,
            duplicate: false,
            invoice_number: payload.invoice_number,
        })
    }

    /// Payment status for polling by the invoice id
    pub async fn status(&self, invoice_id: Uuid, user: &AuthUser) -> AppResult<PaymentStatusView> {
        let view = sqlx::query_as::<_, PaymentStatusView>(
            r#"
            SELECT i.invoice_number,
                   i.status AS invoice_status,
                   i.total,
                   pt.transaction_ref,
                   i.paid_at
            FROM invoices i
            JOIN applications a ON a.id = i.application_id
            LEFT JOIN payment_transactions pt
                   ON pt.invoice_id = i.id AND pt.status = 'success'
            WHERE i.id = $1 AND ($2 OR a.farmer_id = $3)
            "#,
        )
        .bind(invoice_id)
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        Ok(view)
    }
}
