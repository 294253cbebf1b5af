//! On-site audit service: scheduling, the auditor worklist, and results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::{notification, workflow};
use shared::models::{AuditResult, UserRole};
use shared::types::{Paginated, Pagination};
use shared::workflow::{ApplicationStatus, WorkflowAction};

/// Audit service
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

/// Input for scheduling an audit
#[derive(Debug, Deserialize)]
pub struct ScheduleAuditInput {
    pub application_id: Uuid,
    pub auditor_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
}

/// Input for submitting an audit result
#[derive(Debug, Deserialize)]
pub struct AuditResultInput {
    pub result: AuditResult,
    pub notes: Option<String>,
}

/// An audit row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub auditor_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Worklist entry for an auditor
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorklistEntry {
    pub audit_id: Uuid,
    pub application_id: Uuid,
    pub application_number: String,
    pub herb_name: String,
    pub application_status: String,
    pub scheduled_date: DateTime<Utc>,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Schedule an on-site audit: assigns the auditor, moves the application
    /// to AUDIT_SCHEDULED, and notifies both parties.
    pub async fn schedule(&self, user: &AuthUser, input: ScheduleAuditInput) -> AppResult<AuditRow> {
        user.require_role(&[UserRole::Reviewer, UserRole::Admin])?;

        if input.scheduled_date < Utc::now() {
            return Err(AppError::Validation {
                field: "scheduled_date".to_string(),
                message: "Audit date must be in the future".to_string(),
                message_th: "วันที่ตรวจประเมินต้องเป็นวันในอนาคต".to_string(),
            });
        }

        // The assignee must hold the auditor role
        let auditor_role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM users WHERE id = $1 AND is_active = true",
        )
        .bind(input.auditor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Auditor".to_string()))?;

        if auditor_role != UserRole::Auditor.as_str() {
            return Err(AppError::Validation {
                field: "auditor_id".to_string(),
                message: "Assignee is not an auditor".to_string(),
                message_th: "ผู้ได้รับมอบหมายไม่ใช่ผู้ตรวจประเมิน".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let (farmer_id, application_number, status_str) =
            sqlx::query_as::<_, (Uuid, String, String)>(
                r#"
                SELECT farmer_id, application_number, status
                FROM applications
                WHERE id = $1 AND is_deleted = false
                FOR UPDATE
                "#,
            )
            .bind(input.application_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Application".to_string()))?;

        let current: ApplicationStatus = status_str.parse()?;

        workflow::record_transition(
            &mut tx,
            input.application_id,
            current,
            WorkflowAction::ScheduleAudit,
            Some(user.user_id),
            user.role.actor(),
            None,
        )
        .await?;

        let audit = sqlx::query_as::<_, AuditRow>(
            r#"
            INSERT INTO audits (application_id, auditor_id, scheduled_date)
            VALUES ($1, $2, $3)
            RETURNING id, application_id, auditor_id, scheduled_date, started_at,
                      completed_at, result, notes, created_at
            "#,
        )
        .bind(input.application_id)
        .bind(input.auditor_id)
        .bind(input.scheduled_date)
        .fetch_one(&mut *tx)
        .await?;

        notification::notify_tx(
            &mut tx,
            input.auditor_id,
            Some(input.application_id),
            "ได้รับมอบหมายการตรวจประเมิน",
            &format!(
                "คำขอ {} นัดตรวจประเมินวันที่ {}",
                application_number,
                input.scheduled_date.format("%Y-%m-%d")
            ),
        )
        .await?;
        notification::notify_tx(
            &mut tx,
            farmer_id,
            Some(input.application_id),
            "นัดหมายตรวจประเมินแหล่งปลูก",
            &format!(
                "คำขอ {} นัดตรวจประเมินวันที่ {}",
                application_number,
                input.scheduled_date.format("%Y-%m-%d")
            ),
        )
        .await?;

        tx.commit().await?;

        Ok(audit)
    }

    /// Scheduled and in-progress audits assigned to the calling auditor
    pub async fn worklist(
        &self,
        user: &AuthUser,
        pagination: Pagination,
    ) -> AppResult<Paginated<WorklistEntry>> {
        user.require_role(&[UserRole::Auditor])?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM audits au
            JOIN applications a ON a.id = au.application_id
            WHERE au.auditor_id = $1 AND au.completed_at IS NULL
            "#,
        )
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, WorklistEntry>(
            r#"
            SELECT au.id AS audit_id,
                   a.id AS application_id,
                   a.application_number,
                   a.herb_name,
                   a.status AS application_status,
                   au.scheduled_date
            FROM audits au
            JOIN applications a ON a.id = au.application_id
            WHERE au.auditor_id = $1 AND au.completed_at IS NULL
            ORDER BY au.scheduled_date ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user.user_id)
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(rows, &pagination, total))
    }

    /// Auditor starts the on-site audit
    pub async fn start(&self, application_id: Uuid, user: &AuthUser) -> AppResult<AuditRow> {
        user.require_role(&[UserRole::Auditor])?;

        let mut tx = self.db.begin().await?;

        let audit = self.open_audit_for(&mut tx, application_id, user.user_id).await?;

        let status_str = sqlx::query_scalar::<_, String>(
            "SELECT status FROM applications WHERE id = $1 FOR UPDATE",
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;
        let current: ApplicationStatus = status_str.parse()?;

        workflow::record_transition(
            &mut tx,
            application_id,
            current,
            WorkflowAction::StartAudit,
            Some(user.user_id),
            user.role.actor(),
            None,
        )
        .await?;

        let audit = sqlx::query_as::<_, AuditRow>(
            r#"
            UPDATE audits SET started_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING id, application_id, auditor_id, scheduled_date, started_at,
                      completed_at, result, notes, created_at
            "#,
        )
        .bind(audit.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(audit)
    }

    /// Auditor submits the result. PASS approves the application, FAIL
    /// rejects it, CONDITIONAL sends it back for corrections.
    pub async fn submit_result(
        &self,
        application_id: Uuid,
        user: &AuthUser,
        input: AuditResultInput,
    ) -> AppResult<AuditRow> {
        user.require_role(&[UserRole::Auditor])?;

        let mut tx = self.db.begin().await?;

        let audit = self.open_audit_for(&mut tx, application_id, user.user_id).await?;

        let (farmer_id, application_number, status_str) =
            sqlx::query_as::<_, (Uuid, String, String)>(
                "SELECT farmer_id, application_number, status FROM applications WHERE id = $1 FOR UPDATE",
            )
            .bind(application_id)
            .fetch_one(&mut *tx)
            .await?;
        let current: ApplicationStatus = status_str.parse()?;

        let action = match input.result {
            AuditResult::Pass => WorkflowAction::AuditPass,
            AuditResult::Fail => WorkflowAction::AuditFail,
            AuditResult::Conditional => WorkflowAction::AuditConditional,
        };

        workflow::record_transition(
            &mut tx,
            application_id,
            current,
            action,
            Some(user.user_id),
            user.role.actor(),
            input.notes.as_deref(),
        )
        .await?;

        sqlx::query("UPDATE applications SET audit_result = $2 WHERE id = $1")
            .bind(application_id)
            .bind(input.result.as_str())
            .execute(&mut *tx)
            .await?;

        let audit = sqlx::query_as::<_, AuditRow>(
            r#"
            UPDATE audits
            SET completed_at = NOW(), result = $2, notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, application_id, auditor_id, scheduled_date, started_at,
                      completed_at, result, notes, created_at
            "#,
        )
        .bind(audit.id)
        .bind(input.result.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let (title, message) = match input.result {
            AuditResult::Pass => (
                "ผ่านการตรวจประเมิน",
                format!("คำขอ {} ผ่านการตรวจประเมินแหล่งปลูก", application_number),
            ),
            AuditResult::Fail => (
                "ไม่ผ่านการตรวจประเมิน",
                format!("คำขอ {} ไม่ผ่านการตรวจประเมินแหล่งปลูก", application_number),
            ),
            AuditResult::Conditional => (
                "ผ่านแบบมีเงื่อนไข",
                format!(
                    "คำขอ {} ต้องแก้ไขตามข้อสังเกตของผู้ตรวจประเมิน",
                    application_number
                ),
            ),
        };
        notification::notify_tx(&mut tx, farmer_id, Some(application_id), title, &message).await?;

        tx.commit().await?;

        Ok(audit)
    }

    /// The open (not yet completed) audit assigned to this auditor for an
    /// application
    async fn open_audit_for(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        application_id: Uuid,
        auditor_id: Uuid,
    ) -> AppResult<AuditRow> {
        let audit = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, application_id, auditor_id, scheduled_date, started_at,
                   completed_at, result, notes, created_at
            FROM audits
            WHERE application_id = $1 AND auditor_id = $2 AND completed_at IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(application_id)
        .bind(auditor_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Audit assignment".to_string()))?;

        Ok(audit)
    }
}
