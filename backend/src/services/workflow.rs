//! Transition persistence for the application pipeline
//!
//! Every status change in the system goes through [`record_transition`]: the
//! state machine validates the move, a status-guarded UPDATE applies it, and a
//! workflow event is appended, all on the caller's transaction. A concurrent
//! transition makes the guarded UPDATE touch zero rows and surfaces as a
//! conflict instead of silently overwriting.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::workflow::{self, ActorRole, ApplicationStatus, WorkflowAction};

/// Apply a workflow action to an application and append the event row.
///
/// `current` must be the status the caller just read; the UPDATE is guarded on
/// it. Returns the status the application moved to.
pub async fn record_transition(
    conn: &mut PgConnection,
    application_id: Uuid,
    current: ApplicationStatus,
    action: WorkflowAction,
    actor_id: Option<Uuid>,
    actor_role: ActorRole,
    note: Option<&str>,
) -> AppResult<ApplicationStatus> {
    let next = workflow::apply(current, action, actor_role)?;

    let updated = sqlx::query(
        "UPDATE applications SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
    )
    .bind(application_id)
    .bind(current.as_str())
    .bind(next.as_str())
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::Conflict {
            resource: "application".to_string(),
            message: "Application status changed concurrently, please retry".to_string(),
            message_th: "สถานะคำขอถูกเปลี่ยนแปลงพร้อมกัน กรุณาลองใหม่".to_string(),
        });
    }

    sqlx::query(
        r#"
        INSERT INTO workflow_events
            (application_id, action, actor_id, actor_role, from_status, to_status, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(application_id)
    .bind(action.as_str())
    .bind(actor_id)
    .bind(actor_role.as_str())
    .bind(current.as_str())
    .bind(next.as_str())
    .bind(note)
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        application_id = %application_id,
        action = %action,
        from = %current,
        to = %next,
        "application transitioned"
    );

    Ok(next)
}
