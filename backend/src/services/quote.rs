//! Quote service
//!
//! Quotes price the services the standard fee schedule does not cover
//! (certificate replacement and other team-reviewed requests). An accepted
//! quote converts 1:1 into an invoice.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::invoice::{create_invoice_tx, InvoiceRow};
use crate::services::notification;
use shared::models::{compute_totals, InvoiceItem, QuoteStatus, ServicePhase, ServiceType};
use shared::types::{Paginated, Pagination};
use shared::workflow::ApplicationStatus;

/// Quote service
#[derive(Clone)]
pub struct QuoteService {
    db: PgPool,
}

/// Input for creating a quote
#[derive(Debug, Deserialize)]
pub struct CreateQuoteInput {
    pub application_id: Uuid,
    pub items: Vec<InvoiceItem>,
    pub valid_until: DateTime<Utc>,
}

/// A quote row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct QuoteRow {
    pub id: Uuid,
    pub quote_number: String,
    pub application_id: Uuid,
    pub items: serde_json::Value,
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
    pub status: String,
    pub valid_until: DateTime<Utc>,
    pub created_by: Uuid,
    pub invoice_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl QuoteRow {
    pub fn status_enum(&self) -> AppResult<QuoteStatus> {
        self.status.parse().map_err(AppError::Internal)
    }
}

/// Response when a quote is accepted
#[derive(Debug, Serialize)]
pub struct AcceptQuoteResponse {
    pub quote: QuoteRow,
    pub invoice: InvoiceRow,
}

/// Format a quote number: QT-YYYY-NNNNNN
fn format_quote_number(year: i32, sequence: i64) -> String {
    format!("QT-{}-{:06}", year, sequence)
}

/// The fee phase an accepted quote settles. Only applications sitting at a
/// payment gate can convert a quote into an invoice.
fn quoted_phase(status: ApplicationStatus) -> Option<ServicePhase> {
    match status.payment_phase() {
        Some(1) => Some(ServicePhase::ApplicationFee),
        Some(2) => Some(ServicePhase::AuditFee),
        _ => None,
    }
}

const QUOTE_COLUMNS: &str = r#"
    id, quote_number, application_id, items, subtotal, vat, total, status,
    valid_until, created_by, invoice_id, created_at
"#;

impl QuoteService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a draft quote for an application (staff only)
    pub async fn create(&self, user: &AuthUser, input: CreateQuoteInput) -> AppResult<QuoteRow> {
        user.require_staff()?;

        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A quote needs at least one line item".to_string(),
                message_th: "ใบเสนอราคาต้องมีรายการอย่างน้อยหนึ่งรายการ".to_string(),
            });
        }

        // Standard new/renewal services are billed by the phase fee schedule;
        // quoting one would create a second payable invoice alongside it.
        let service_type_str = sqlx::query_scalar::<_, String>(
            "SELECT service_type FROM applications WHERE id = $1 AND is_deleted = false",
        )
        .bind(input.application_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Application".to_string()))?;

        let service_type: ServiceType = service_type_str.parse().map_err(AppError::Internal)?;
        if !service_type.requires_quote() {
            return Err(AppError::Validation {
                field: "application_id".to_string(),
                message: format!(
                    "Service type '{}' is billed by the standard fee schedule, not by quote",
                    service_type.as_str()
                ),
                message_th: "บริการประเภทนี้ใช้อัตราค่าธรรมเนียมมาตรฐาน ไม่ต้องใช้ใบเสนอราคา"
                    .to_string(),
            });
        }

        let totals = compute_totals(&input.items);
        let items_json = serde_json::to_value(&input.items)
            .map_err(|e| AppError::Internal(format!("Failed to serialize quote items: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let year = Utc::now().year();
        let sequence = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) + 1 FROM quotes WHERE quote_number LIKE $1",
        )
        .bind(format!("QT-{}-%", year))
        .fetch_one(&mut *tx)
        .await?;

        let quote = sqlx::query_as::<_, QuoteRow>(&format!(
            r#"
            INSERT INTO quotes
                (quote_number, application_id, items, subtotal, vat, total, status,
                 valid_until, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, $8)
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(format_quote_number(year, sequence))
        .bind(input.application_id)
        .bind(&items_json)
        .bind(totals.subtotal)
        .bind(totals.vat)
        .bind(totals.total)
        .bind(input.valid_until)
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(quote)
    }

    /// Send a draft quote to the farmer
    pub async fn send(&self, id: Uuid, user: &AuthUser) -> AppResult<QuoteRow> {
        user.require_staff()?;

        let quote = self.get(id, user).await?;
        if quote.status_enum()? != QuoteStatus::Draft {
            return Err(AppError::InvalidStateTransition(format!(
                "Quote {} is {}, only drafts can be sent",
                quote.quote_number, quote.status
            )));
        }

        let mut tx = self.db.begin().await?;

        let quote = sqlx::query_as::<_, QuoteRow>(&format!(
            "UPDATE quotes SET status = 'sent', updated_at = NOW() WHERE id = $1 RETURNING {QUOTE_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let farmer_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT farmer_id FROM applications WHERE id = $1",
        )
        .bind(quote.application_id)
        .fetch_one(&mut *tx)
        .await?;

        notification::notify_tx(
            &mut tx,
            farmer_id,
            Some(quote.application_id),
            "ใบเสนอราคาใหม่",
            &format!(
                "ใบเสนอราคา {} จำนวน {} บาท รอการตอบรับ",
                quote.quote_number, quote.total
            ),
        )
        .await?;

        tx.commit().await?;

        Ok(quote)
    }

    /// Farmer accepts a sent quote; the matching invoice is created in the
    /// same transaction.
    pub async fn accept(&self, id: Uuid, user: &AuthUser) -> AppResult<AcceptQuoteResponse> {
        let mut tx = self.db.begin().await?;

        let quote = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT q.id, q.quote_number, q.application_id, q.items, q.subtotal, q.vat,
                   q.total, q.status, q.valid_until, q.created_by, q.invoice_id, q.created_at
            FROM quotes q
            JOIN applications a ON a.id = q.application_id
            WHERE q.id = $1 AND a.farmer_id = $2
            FOR UPDATE OF q
            "#,
        )
        .bind(id)
        .bind(user.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Quote".to_string()))?;

        if quote.status_enum()? != QuoteStatus::Sent {
            return Err(AppError::InvalidStateTransition(format!(
                "Quote {} is {}, only sent quotes can be accepted",
                quote.quote_number, quote.status
            )));
        }
        if quote.valid_until < Utc::now() {
            return Err(AppError::InvalidStateTransition(format!(
                "Quote {} has expired",
                quote.quote_number
            )));
        }

        let items: Vec<InvoiceItem> = serde_json::from_value(quote.items.clone())
            .map_err(|e| AppError::Internal(format!("Corrupt quote items: {}", e)))?;

        // The quoted amount settles whichever fee gate the application is at.
        // Off a gate there is nothing for the invoice to unlock, so refuse
        // rather than bill an amount the workflow cannot consume.
        let status_str = sqlx::query_scalar::<_, String>(
            "SELECT status FROM applications WHERE id = $1",
        )
        .bind(quote.application_id)
        .fetch_one(&mut *tx)
        .await?;
        let app_status: ApplicationStatus = status_str.parse()?;
        let phase = quoted_phase(app_status).ok_or_else(|| {
            AppError::InvalidStateTransition(format!(
                "Application is {}, not awaiting a fee payment",
                app_status
            ))
        })?;

        let invoice = create_invoice_tx(&mut tx, quote.application_id, phase, &items).await?;

        let quote = sqlx::query_as::<_, QuoteRow>(&format!(
            r#"
            UPDATE quotes SET status = 'accepted', invoice_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(invoice.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AcceptQuoteResponse { quote, invoice })
    }

    /// Farmer rejects a sent quote
    pub async fn reject(&self, id: Uuid, user: &AuthUser) -> AppResult<QuoteRow> {
        let quote = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT q.id, q.quote_number, q.application_id, q.items, q.subtotal, q.vat,
                   q.total, q.status, q.valid_until, q.created_by, q.invoice_id, q.created_at
            FROM quotes q
            JOIN applications a ON a.id = q.application_id
            WHERE q.id = $1 AND a.farmer_id = $2
            "#,
        )
        .bind(id)
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Quote".to_string()))?;

        if quote.status_enum()? != QuoteStatus::Sent {
            return Err(AppError::InvalidStateTransition(format!(
                "Quote {} is {}, only sent quotes can be rejected",
                quote.quote_number, quote.status
            )));
        }

        let quote = sqlx::query_as::<_, QuoteRow>(&format!(
            "UPDATE quotes SET status = 'rejected', updated_at = NOW() WHERE id = $1 RETURNING {QUOTE_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(quote)
    }

    /// Expire sent quotes past their valid-until date
    pub async fn expire_sweep(&self, user: &AuthUser) -> AppResult<u64> {
        user.require_staff()?;

        let updated = sqlx::query(
            "UPDATE quotes SET status = 'expired', updated_at = NOW() WHERE status = 'sent' AND valid_until < NOW()",
        )
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(updated)
    }

    /// Get a quote. Farmers only see quotes on their own applications.
    pub async fn get(&self, id: Uuid, user: &AuthUser) -> AppResult<QuoteRow> {
        let quote = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT q.id, q.quote_number, q.application_id, q.items, q.subtotal, q.vat,
                   q.total, q.status, q.valid_until, q.created_by, q.invoice_id, q.created_at
            FROM quotes q
            JOIN applications a ON a.id = q.application_id
            WHERE q.id = $1 AND ($2 OR a.farmer_id = $3)
            "#,
        )
        .bind(id)
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Quote".to_string()))?;

        Ok(quote)
    }

    /// List quotes visible to the caller
    pub async fn list(
        &self,
        user: &AuthUser,
        pagination: Pagination,
    ) -> AppResult<Paginated<QuoteRow>> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM quotes q
            JOIN applications a ON a.id = q.application_id
            WHERE ($1 OR a.farmer_id = $2)
            "#,
        )
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT q.id, q.quote_number, q.application_id, q.items, q.subtotal, q.vat,
                   q.total, q.status, q.valid_until, q.created_by, q.invoice_id, q.created_at
            FROM quotes q
            JOIN applications a ON a.id = q.application_id
            WHERE ($1 OR a.farmer_id = $2)
            ORDER BY q.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user.is_staff())
        .bind(user.user_id)
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(rows, &pagination, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::workflow::ApplicationStatus::*;

    #[test]
    fn test_quote_number_format() {
        assert_eq!(format_quote_number(2026, 7), "QT-2026-000007");
    }

    /// Acceptance maps each payment gate to its fee phase and nothing else
    #[test]
    fn test_quoted_phase_at_payment_gates() {
        assert_eq!(quoted_phase(Payment1Pending), Some(ServicePhase::ApplicationFee));
        assert_eq!(quoted_phase(Payment2Pending), Some(ServicePhase::AuditFee));
    }

    /// An application off a payment gate cannot convert a quote into an
    /// invoice; a stray invoice there would be unsettleable and double-bill
    /// the farmer.
    #[test]
    fn test_quoted_phase_refused_off_gate() {
        for status in ApplicationStatus::ALL {
            if status.payment_phase().is_none() {
                assert_eq!(quoted_phase(status), None, "{} must not be quotable", status);
            }
        }
    }

    /// Only replacement requests are priced by quote; the standard services
    /// already get phase invoices from the workflow.
    #[test]
    fn test_only_quote_priced_services_accepted() {
        for service_type in ServiceType::ALL {
            assert_eq!(
                service_type.requires_quote(),
                service_type == ServiceType::Replacement
            );
        }
    }
}
