//! In-app notification service
//!
//! Notifications are database rows only; there is no external delivery
//! channel. Workflow services insert them on the same transaction as the
//! status change they announce.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{Paginated, Pagination};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// A notification row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub application_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert a notification on the caller's transaction
pub async fn notify_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    application_id: Option<Uuid>,
    title: &str,
    message: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, application_id, title, message)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(application_id)
    .bind(title)
    .bind(message)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List notifications for a user, newest first
    pub async fn list(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Paginated<NotificationResponse>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, NotificationResponse>(
            r#"
            SELECT id, application_id, title, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(rows, &pagination, total))
    }

    /// Count of unread notifications
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark one notification as read
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let updated = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }
        Ok(())
    }

    /// Mark every notification for the user as read
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let updated = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(updated)
    }
}
