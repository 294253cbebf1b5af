//! Invoice service: fee invoice generation, listing, and settlement
//!
//! Invoice creation has exactly one implementation. Applications entering a
//! payment-pending status, and quotes being accepted, both land here.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::{notification, workflow};
use shared::models::{
    compute_totals, format_invoice_number, phase_items, InvoiceItem, InvoiceStatus, ServicePhase,
    INVOICE_DUE_DAYS,
};
use shared::types::{Paginated, Pagination};
use shared::workflow::{ActorRole, ApplicationStatus, WorkflowAction};

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
}

/// An invoice row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub application_id: Uuid,
    pub phase: String,
    pub items: serde_json::Value,
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InvoiceRow {
    pub fn status_enum(&self) -> AppResult<InvoiceStatus> {
        self.status.parse().map_err(AppError::Internal)
    }

    pub fn phase_enum(&self) -> AppResult<ServicePhase> {
        self.phase.parse().map_err(AppError::Internal)
    }
}

/// Create an invoice for arbitrary line items on the caller's transaction
pub async fn create_invoice_tx(
    conn: &mut PgConnection,
    application_id: Uuid,
    phase: ServicePhase,
    items: &[InvoiceItem],
) -> AppResult<InvoiceRow> {
    let totals = compute_totals(items);
    let year = Utc::now().year();

    let sequence = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) + 1 FROM invoices WHERE invoice_number LIKE $1",
    )
    .bind(format!("INV-{}-%", year))
    .fetch_one(&mut *conn)
    .await?;

    let invoice_number = format_invoice_number(year, sequence);
    let due_date = Utc::now() + Duration::days(INVOICE_DUE_DAYS);
    let items_json = serde_json::to_value(items)
        .map_err(|e| AppError::Internal(format!("Failed to serialize invoice items: {}", e)))?;

    let invoice = sqlx::query_as::<_, InvoiceRow>(
        r#"
        INSERT INTO invoices
            (invoice_number, application_id, phase, items, subtotal, vat, total, status, due_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
        RETURNING id, invoice_number, application_id, phase, items, subtotal, vat, total,
                  status, due_date, paid_at, payment_reference, created_at
        "#,
    )
    .bind(&invoice_number)
    .bind(application_id)
    .bind(phase.as_str())
    .bind(&items_json)
    .bind(totals.subtotal)
    .bind(totals.vat)
    .bind(totals.total)
    .bind(due_date)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(
        invoice_number = %invoice.invoice_number,
        application_id = %application_id,
        total = %invoice.total,
        "invoice created"
    );

    Ok(invoice)
}

/// Create a standard fee-schedule invoice for a payment phase
pub async fn create_phase_invoice_tx(
    conn: &mut PgConnection,
    application_id: Uuid,
    phase: ServicePhase,
) -> AppResult<InvoiceRow> {
    let items = phase_items(phase);
    create_invoice_tx(conn, application_id, phase, &items).await
}

/// Settle an invoice and drive the owning application through its payment
/// gate, all on the caller's transaction.
pub async fn settle_invoice_tx(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    payment_reference: &str,
    actor_id: Option<Uuid>,
    actor_role: ActorRole,
) -> AppResult<InvoiceRow> {
    let invoice = sqlx::query_as::<_, InvoiceRow>(
        r#"
        SELECT id, invoice_number, application_id, phase, items, subtotal, vat, total,
               status, due_date, paid_at, payment_reference, created_at
        FROM invoices
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

    if !invoice.status_enum()?.is_payable() {
        return Err(AppError::InvoiceNotPayable(format!(
            "Invoice {} is {}",
            invoice.invoice_number, invoice.status
        )));
    }

    sqlx::query(
        r#"
        UPDATE invoices
        SET status = 'paid', paid_at = NOW(), payment_reference = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(invoice.id)
    .bind(payment_reference)
    .execute(&mut *conn)
    .await?;

    // Drive the application through the matching payment gate
    let (farmer_id, status_str) = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT farmer_id, status FROM applications WHERE id = $1 FOR UPDATE",
    )
    .bind(invoice.application_id)
    .fetch_one(&mut *conn)
    .await?;

    let current: ApplicationStatus = status_str.parse()?;
    let action = match invoice.phase_enum()?.phase_number() {
        1 => WorkflowAction::Phase1Paid,
        _ => WorkflowAction::Phase2Paid,
    };

    let note = format!("Invoice {} paid ({})", invoice.invoice_number, payment_reference);
    workflow::record_transition(
        conn,
        invoice.application_id,
        current,
        action,
        actor_id,
        actor_role,
        Some(&note),
    )
    .await?;

    notification::notify_tx(
        conn,
        farmer_id,
        Some(invoice.application_id),
        "ชำระเงินสำเร็จ",
        &format!(
            "ได้รับชำระเงินตามใบแจ้งหนี้ {} จำนวน {} บาทแล้ว",
            invoice.invoice_number, invoice.total
        ),
    )
    .await?;

    Ok(invoice)
}

impl InvoiceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get an invoice. Farmers can only see invoices on their own applications.
    pub async fn get(&self, id: Uuid, user: &AuthUser) -> AppResult<InvoiceRow> {
        let invoice = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT i.id, i.invoice_number, i.application_id, i.phase, i.items, i.subtotal,
                   i.vat, i.total, i.status, i.due_date, i.paid_at, i.payment_reference,
                   i.created_at
            FROM invoices i
            JOIN applications a ON a.id = i.application_id
            WHERE i.id = $1 AND ($2 OR a.farmer_id = $3)
            "#,
        )
        .bind(id)
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        Ok(invoice)
    }

    /// List invoices. Staff see all, farmers see their own.
    pub async fn list(
        &self,
        user: &AuthUser,
        status: Option<InvoiceStatus>,
        pagination: Pagination,
    ) -> AppResult<Paginated<InvoiceRow>> {
        let status_str = status.map(|s| s.as_str().to_string());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM invoices i
            JOIN applications a ON a.id = i.application_id
            WHERE ($1 OR a.farmer_id = $2)
              AND ($3::text IS NULL OR i.status = $3)
            "#,
        )
        .bind(user.is_staff())
        .bind(user.user_id)
        .bind(&status_str)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT i.id, i.invoice_number, i.application_id, i.phase, i.items, i.subtotal,
                   i.vat, i.total, i.status, i.due_date, i.paid_at, i.payment_reference,
                   i.created_at
            FROM invoices i
            JOIN applications a ON a.id = i.application_id
            WHERE ($1 OR a.farmer_id = $2)
              AND ($3::text IS NULL OR i.status = $3)
            ORDER BY i.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user.is_staff())
        .bind(user.user_id)
        .bind(&status_str)
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(rows, &pagination, total))
    }

    /// Manually mark an invoice paid (staff, e.g. over-the-counter payment)
    pub async fn mark_paid(
        &self,
        id: Uuid,
        user: &AuthUser,
        payment_reference: Option<String>,
    ) -> AppResult<InvoiceRow> {
        user.require_staff()?;

        let reference = payment_reference.unwrap_or_else(|| "manual".to_string());

        let mut tx = self.db.begin().await?;
        let invoice = settle_invoice_tx(
            &mut tx,
            id,
            &reference,
            Some(user.user_id),
            user.role.actor(),
        )
        .await?;
        tx.commit().await?;

        Ok(invoice)
    }

    /// Flip pending invoices past their due date to overdue. Returns the
    /// number of invoices affected.
    pub async fn overdue_sweep(&self, user: &AuthUser) -> AppResult<u64> {
        user.require_staff()?;

        let updated = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'overdue', updated_at = NOW()
            WHERE status = 'pending' AND due_date < NOW()
            "#,
        )
        .execute(&self.db)
        .await?
        .rows_affected();

        if updated > 0 {
            tracing::info!(count = updated, "invoices marked overdue");
        }

        Ok(updated)
    }
}
