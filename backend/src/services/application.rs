//! Certification application service
//!
//! Draft creation, form updates, and every farmer/reviewer pipeline action.
//! Status moves are delegated to the workflow state machine and persisted via
//! `services::workflow::record_transition`, always together with their side
//! effects (invoice, notification) in one transaction.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::invoice::{create_phase_invoice_tx, InvoiceRow};
use crate::services::{notification, workflow};
use shared::models::{format_application_number, AreaType, ServicePhase, ServiceType, UserRole};
use shared::types::{Paginated, Pagination};
use shared::validation;
use shared::workflow::{ApplicationStatus, WorkflowAction, MAX_REVISION_REQUESTS};

/// Application service
#[derive(Clone)]
pub struct ApplicationService {
    db: PgPool,
}

/// Input for creating a draft application
#[derive(Debug, Deserialize)]
pub struct CreateApplicationInput {
    pub service_type: ServiceType,
    pub area_type: AreaType,
    /// Herb species under cultivation
    pub herb_name: String,
    pub cultivation_area_rai: Decimal,
    /// Free-form GACP form payload
    pub form_data: Option<serde_json::Value>,
}

/// Input for updating an editable application
#[derive(Debug, Deserialize)]
pub struct UpdateApplicationInput {
    pub herb_name: Option<String>,
    pub cultivation_area_rai: Option<Decimal>,
    pub form_data: Option<serde_json::Value>,
}

/// Reviewer decision on the submitted documents
#[derive(Debug, Deserialize)]
pub struct ReviewDecisionInput {
    pub approved: bool,
    pub comment: Option<String>,
}

/// An application row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub application_number: String,
    pub farmer_id: Uuid,
    pub service_type: String,
    pub area_type: String,
    pub herb_name: String,
    pub cultivation_area_rai: Decimal,
    pub form_data: serde_json::Value,
    pub status: String,
    pub reject_count: i32,
    pub audit_result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    pub fn status_enum(&self) -> AppResult<ApplicationStatus> {
        Ok(self.status.parse()?)
    }

    pub fn service_type_enum(&self) -> AppResult<ServiceType> {
        self.service_type.parse().map_err(AppError::Internal)
    }
}

/// Outcome of a pipeline action
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    /// Invoice issued as part of the transition, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceRow>,
}

/// One entry of the append-only workflow history
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorkflowEventResponse {
    pub id: Uuid,
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub actor_role: String,
    pub from_status: String,
    pub to_status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Staff dashboard counters
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_applications: i64,
    pub by_status: HashMap<String, i64>,
    /// Sum of paid invoice totals
    pub revenue: Decimal,
}

const APPLICATION_COLUMNS: &str = r#"
    id, application_number, farmer_id, service_type, area_type, herb_name,
    cultivation_area_rai, form_data, status, reject_count, audit_result,
    created_at, updated_at
"#;

impl ApplicationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a draft application. A farmer may hold at most one draft.
    pub async fn create(
        &self,
        user: &AuthUser,
        input: CreateApplicationInput,
    ) -> AppResult<ApplicationRow> {
        if user.role != UserRole::Farmer {
            return Err(AppError::InsufficientPermissions);
        }

        if input.herb_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "herb_name".to_string(),
                message: "Herb name is required".to_string(),
                message_th: "กรุณาระบุชื่อสมุนไพร".to_string(),
            });
        }
        if let Err(msg) = validation::validate_cultivation_area(input.cultivation_area_rai) {
            return Err(AppError::Validation {
                field: "cultivation_area_rai".to_string(),
                message: msg.to_string(),
                message_th: "พื้นที่เพาะปลูกไม่ถูกต้อง".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        // One draft per farmer
        let existing_draft = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE farmer_id = $1 AND status = 'DRAFT' AND is_deleted = false
            "#,
        )
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if existing_draft > 0 {
            return Err(AppError::Conflict {
                resource: "application".to_string(),
                message: "You already have a draft application".to_string(),
                message_th: "คุณมีคำขอฉบับร่างอยู่แล้ว".to_string(),
            });
        }

        let year = Utc::now().year();
        let sequence = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) + 1 FROM applications WHERE application_number LIKE $1",
        )
        .bind(format!("GACP-APP-{}-%", year))
        .fetch_one(&mut *tx)
        .await?;

        let application_number = format_application_number(year, sequence);
        let form_data = input.form_data.unwrap_or_else(|| serde_json::json!({}));

        let application = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications
                (application_number, farmer_id, service_type, area_type, herb_name,
                 cultivation_area_rai, form_data, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'DRAFT')
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(&application_number)
        .bind(user.user_id)
        .bind(input.service_type.as_str())
        .bind(input.area_type.as_str())
        .bind(input.herb_name.trim())
        .bind(input.cultivation_area_rai)
        .bind(&form_data)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            application_number = %application.application_number,
            farmer_id = %user.user_id,
            "application draft created"
        );

        Ok(application)
    }

    /// Get one application. Farmers see only their own.
    pub async fn get(&self, id: Uuid, user: &AuthUser) -> AppResult<ApplicationRow> {
        let application = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE id = $1 AND is_deleted = false AND ($2 OR farmer_id = $3)
            "#
        ))
        .bind(id)
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Application".to_string()))?;

        Ok(application)
    }

    /// List applications. Staff see all (optionally filtered by status),
    /// farmers see their own.
    pub async fn list(
        &self,
        user: &AuthUser,
        status: Option<ApplicationStatus>,
        pagination: Pagination,
    ) -> AppResult<Paginated<ApplicationRow>> {
        let status_str = status.map(|s| s.as_str().to_string());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE is_deleted = false
              AND ($1 OR farmer_id = $2)
              AND ($3::text IS NULL OR status = $3)
            "#,
        )
        .bind(user.is_staff())
        .bind(user.user_id)
        .bind(&status_str)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE is_deleted = false
              AND ($1 OR farmer_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(user.is_staff())
        .bind(user.user_id)
        .bind(&status_str)
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(rows, &pagination, total))
    }

    /// Update the form payload. Only the owner, only in an editable status.
    pub async fn update(
        &self,
        id: Uuid,
        user: &AuthUser,
        input: UpdateApplicationInput,
    ) -> AppResult<ApplicationRow> {
        let application = self.get_owned(id, user).await?;

        if !application.status_enum()?.is_editable() {
            return Err(AppError::InvalidStateTransition(format!(
                "Application in status {} cannot be edited",
                application.status
            )));
        }

        if let Some(area) = input.cultivation_area_rai {
            if let Err(msg) = validation::validate_cultivation_area(area) {
                return Err(AppError::Validation {
                    field: "cultivation_area_rai".to_string(),
                    message: msg.to_string(),
                    message_th: "พื้นที่เพาะปลูกไม่ถูกต้อง".to_string(),
                });
            }
        }

        let updated = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET herb_name = COALESCE($2, herb_name),
                cultivation_area_rai = COALESCE($3, cultivation_area_rai),
                form_data = COALESCE($4, form_data),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(application.id)
        .bind(input.herb_name)
        .bind(input.cultivation_area_rai)
        .bind(input.form_data)
        .fetch_one(&self.db)
        .await?;

        Ok(updated)
    }

    /// Soft delete a draft
    pub async fn delete_draft(&self, id: Uuid, user: &AuthUser) -> AppResult<()> {
        let application = self.get_owned(id, user).await?;

        if application.status_enum()? != ApplicationStatus::Draft {
            return Err(AppError::InvalidStateTransition(
                "Only draft applications can be deleted".to_string(),
            ));
        }

        sqlx::query("UPDATE applications SET is_deleted = true, updated_at = NOW() WHERE id = $1")
            .bind(application.id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Farmer confirms the draft for review. Issues the phase-1 invoice in
    /// the same transaction (team-reviewed services are priced by quote
    /// instead and get their invoice on quote acceptance).
    pub async fn confirm_review(&self, id: Uuid, user: &AuthUser) -> AppResult<TransitionResponse> {
        let application = self.get_owned(id, user).await?;
        let current = application.status_enum()?;

        let mut tx = self.db.begin().await?;

        let status = workflow::record_transition(
            &mut tx,
            application.id,
            current,
            WorkflowAction::ConfirmReview,
            Some(user.user_id),
            user.role.actor(),
            None,
        )
        .await?;

        let invoice = if application.service_type_enum()?.requires_quote() {
            None
        } else {
            Some(create_phase_invoice_tx(&mut tx, application.id, ServicePhase::ApplicationFee).await?)
        };

        notification::notify_tx(
            &mut tx,
            application.farmer_id,
            Some(application.id),
            "ยืนยันคำขอแล้ว",
            &match &invoice {
                Some(inv) => format!(
                    "คำขอ {} รอชำระค่าธรรมเนียมตามใบแจ้งหนี้ {}",
                    application.application_number, inv.invoice_number
                ),
                None => format!(
                    "คำขอ {} รอใบเสนอราคาจากเจ้าหน้าที่",
                    application.application_number
                ),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(TransitionResponse {
            application_id: application.id,
            status,
            invoice,
        })
    }

    /// Farmer resubmits after a revision request
    pub async fn resubmit(
        &self,
        id: Uuid,
        user: &AuthUser,
        comment: Option<String>,
    ) -> AppResult<TransitionResponse> {
        let application = self.get_owned(id, user).await?;
        let current = application.status_enum()?;

        let mut tx = self.db.begin().await?;
        let status = workflow::record_transition(
            &mut tx,
            application.id,
            current,
            WorkflowAction::Resubmit,
            Some(user.user_id),
            user.role.actor(),
            comment.as_deref(),
        )
        .await?;
        tx.commit().await?;

        Ok(TransitionResponse {
            application_id: application.id,
            status,
            invoice: None,
        })
    }

    /// Reviewer picks a submitted application up for document review
    pub async fn start_review(&self, id: Uuid, user: &AuthUser) -> AppResult<TransitionResponse> {
        user.require_role(&[UserRole::Reviewer, UserRole::Admin])?;
        let application = self.get(id, user).await?;
        let current = application.status_enum()?;

        let mut tx = self.db.begin().await?;
        let status = workflow::record_transition(
            &mut tx,
            application.id,
            current,
            WorkflowAction::StartReview,
            Some(user.user_id),
            user.role.actor(),
            None,
        )
        .await?;
        tx.commit().await?;

        Ok(TransitionResponse {
            application_id: application.id,
            status,
            invoice: None,
        })
    }

    /// Reviewer decision on the documents: approve unlocks the phase-2 fee;
    /// reject sends the application back for revision, or rejects outright on
    /// the third strike.
    pub async fn review_decision(
        &self,
        id: Uuid,
        user: &AuthUser,
        input: ReviewDecisionInput,
    ) -> AppResult<TransitionResponse> {
        user.require_role(&[UserRole::Reviewer, UserRole::Admin])?;
        let application = self.get(id, user).await?;
        let current = application.status_enum()?;

        let mut tx = self.db.begin().await?;

        let (status, invoice) = if input.approved {
            let status = workflow::record_transition(
                &mut tx,
                application.id,
                current,
                WorkflowAction::ApproveDocuments,
                Some(user.user_id),
                user.role.actor(),
                input.comment.as_deref(),
            )
            .await?;

            let invoice = if application.service_type_enum()?.requires_quote() {
                None
            } else {
                Some(create_phase_invoice_tx(&mut tx, application.id, ServicePhase::AuditFee).await?)
            };

            notification::notify_tx(
                &mut tx,
                application.farmer_id,
                Some(application.id),
                "เอกสารผ่านการตรวจสอบ",
                &format!(
                    "คำขอ {} ผ่านการตรวจเอกสารแล้ว กรุณาชำระค่าธรรมเนียมตรวจประเมิน",
                    application.application_number
                ),
            )
            .await?;

            (status, invoice)
        } else {
            let reject_count = application.reject_count + 1;

            let action = if reject_count >= MAX_REVISION_REQUESTS {
                WorkflowAction::RejectDocuments
            } else {
                WorkflowAction::RequestRevision
            };

            let status = workflow::record_transition(
                &mut tx,
                application.id,
                current,
                action,
                Some(user.user_id),
                user.role.actor(),
                input.comment.as_deref(),
            )
            .await?;

            sqlx::query("UPDATE applications SET reject_count = $2 WHERE id = $1")
                .bind(application.id)
                .bind(reject_count)
                .execute(&mut *tx)
                .await?;

            let (title, message) = if status == ApplicationStatus::Rejected {
                (
                    "คำขอถูกปฏิเสธ",
                    format!(
                        "คำขอ {} ถูกปฏิเสธหลังการขอแก้ไขครบ {} ครั้ง",
                        application.application_number, MAX_REVISION_REQUESTS
                    ),
                )
            } else {
                (
                    "กรุณาแก้ไขเอกสาร",
                    format!(
                        "คำขอ {} ต้องแก้ไขเอกสาร (ครั้งที่ {})",
                        application.application_number, reject_count
                    ),
                )
            };
            notification::notify_tx(&mut tx, application.farmer_id, Some(application.id), title, &message)
                .await?;

            (status, None)
        };

        tx.commit().await?;

        Ok(TransitionResponse {
            application_id: application.id,
            status,
            invoice,
        })
    }

    /// Workflow history, oldest first
    pub async fn history(&self, id: Uuid, user: &AuthUser) -> AppResult<Vec<WorkflowEventResponse>> {
        // Ownership check
        let application = self.get(id, user).await?;

        let events = sqlx::query_as::<_, WorkflowEventResponse>(
            r#"
            SELECT id, action, actor_id, actor_role, from_status, to_status, note, created_at
            FROM workflow_events
            WHERE application_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(application.id)
        .fetch_all(&self.db)
        .await?;

        Ok(events)
    }

    /// Staff dashboard counters
    pub async fn stats(&self, user: &AuthUser) -> AppResult<DashboardStats> {
        user.require_staff()?;

        let counts = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*) FROM applications
            WHERE is_deleted = false
            GROUP BY status
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let by_status: HashMap<String, i64> = counts.into_iter().collect();
        let total_applications = by_status.values().sum();

        let revenue = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(total) FROM invoices WHERE status = 'paid'",
        )
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        Ok(DashboardStats {
            total_applications,
            by_status,
            revenue,
        })
    }

    /// Fetch an application the caller owns (farmers only reach their own
    /// rows; staff are rejected since these are farmer actions)
    async fn get_owned(&self, id: Uuid, user: &AuthUser) -> AppResult<ApplicationRow> {
        let application = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE id = $1 AND farmer_id = $2 AND is_deleted = false
            "#
        ))
        .bind(id)
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Application".to_string()))?;

        Ok(application)
    }
}
