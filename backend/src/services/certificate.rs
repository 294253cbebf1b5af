//! Certificate issuance and public verification
//!
//! Issuing a certificate for an approved application creates the whole
//! traceability chain in one database transaction: the certificate row, the
//! farm (auto-created when the farmer has none), the initial planting cycle,
//! and the first harvest batch with its QR token. If any step fails the
//! application stays APPROVED and nothing is left half-created.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::{notification, workflow};
use shared::models::{
    format_batch_number, format_certificate_number, tracking_url, verification_url, UserRole,
    CERTIFICATE_VALIDITY_YEARS,
};
use shared::types::{buddhist_year, Paginated, Pagination};
use shared::workflow::{ApplicationStatus, WorkflowAction};

/// Certificate service
#[derive(Clone)]
pub struct CertificateService {
    db: PgPool,
    trace_base: String,
    verify_base: String,
}

/// A certificate row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CertificateRow {
    pub id: Uuid,
    pub certificate_number: String,
    pub verification_code: String,
    pub application_id: Uuid,
    pub farmer_id: Uuid,
    pub farm_id: Uuid,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verification_count: i32,
    pub verification_url: String,
    pub created_at: DateTime<Utc>,
}

/// Everything created by one issuance
#[derive(Debug, Serialize)]
pub struct IssuanceResponse {
    pub certificate: CertificateRow,
    pub farm_id: Uuid,
    pub planting_cycle_id: Uuid,
    pub harvest_batch_id: Uuid,
    pub batch_number: String,
    pub qr_code: String,
    pub tracking_url: String,
}

/// Public verification view
#[derive(Debug, Serialize)]
pub struct VerificationView {
    pub certificate_number: String,
    pub status: String,
    pub farmer_name: String,
    pub farm_name: String,
    pub province: Option<String>,
    pub herb_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

const CERTIFICATE_COLUMNS: &str = r#"
    id, certificate_number, verification_code, application_id, farmer_id, farm_id,
    status, issued_at, expires_at, verification_count, verification_url, created_at
"#;

/// 8 uppercase hex characters printed on the certificate
fn generate_verification_code() -> String {
    format!("{:08X}", rand::random::<u32>())
}

impl CertificateService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            trace_base: config.urls.trace_base.clone(),
            verify_base: config.urls.verify_base.clone(),
        }
    }

    /// Issue a certificate for an APPROVED application (admin only)
    pub async fn issue(&self, application_id: Uuid, user: &AuthUser) -> AppResult<IssuanceResponse> {
        user.require_role(&[UserRole::Admin])?;

        let mut tx = self.db.begin().await?;

        let app = sqlx::query_as::<_, (Uuid, String, String, String, rust_decimal::Decimal, serde_json::Value)>(
            r#"
            SELECT farmer_id, application_number, status, herb_name, cultivation_area_rai, form_data
            FROM applications
            WHERE id = $1 AND is_deleted = false
            FOR UPDATE
            "#,
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Application".to_string()))?;

        let (farmer_id, application_number, status_str, herb_name, area_rai, form_data) = app;
        let current: ApplicationStatus = status_str.parse()?;

        // One certificate per application
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM certificates WHERE application_id = $1",
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "certificate".to_string(),
                message: "A certificate was already issued for this application".to_string(),
                message_th: "คำขอนี้มีใบรับรองออกให้แล้ว".to_string(),
            });
        }

        workflow::record_transition(
            &mut tx,
            application_id,
            current,
            WorkflowAction::IssueCertificate,
            Some(user.user_id),
            user.role.actor(),
            None,
        )
        .await?;

        // Farm: reuse the farmer's registered farm, or create one from the
        // application data
        let farm_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM farms WHERE owner_id = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(farmer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let farm_id = match farm_id {
            Some(id) => id,
            None => {
                let farm_name = form_data
                    .get("farm_name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("แปลงปลูก{}", herb_name));
                let province = form_data
                    .get("province")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);

                sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO farms
                        (owner_id, name, province, total_area_rai, cultivation_area_rai, is_verified)
                    VALUES ($1, $2, $3, $4, $4, true)
                    RETURNING id
                    "#,
                )
                .bind(farmer_id)
                .bind(&farm_name)
                .bind(&province)
                .bind(area_rai)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        // Certificate number sequence resets per Buddhist-era year
        let now = Utc::now();
        let year = now.year();
        let sequence = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) + 1 FROM certificates WHERE certificate_number LIKE $1",
        )
        .bind(format!("GACP-TH-{}-%", buddhist_year(year)))
        .fetch_one(&mut *tx)
        .await?;

        let certificate_number = format_certificate_number(year, sequence);
        let verification_code = generate_verification_code();
        let expires_at = now + Duration::days(365 * CERTIFICATE_VALIDITY_YEARS as i64);
        let verify_url = verification_url(&self.verify_base, &certificate_number, &verification_code);

        let certificate = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            INSERT INTO certificates
                (certificate_number, verification_code, application_id, farmer_id, farm_id,
                 status, issued_at, expires_at, verification_url)
            VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8)
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(&certificate_number)
        .bind(&verification_code)
        .bind(application_id)
        .bind(farmer_id)
        .bind(farm_id)
        .bind(now)
        .bind(expires_at)
        .bind(&verify_url)
        .fetch_one(&mut *tx)
        .await?;

        // Initial planting cycle under the new certificate
        let planting_cycle_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO planting_cycles (farm_id, certificate_id, name, crop_name, start_date, status)
            VALUES ($1, $2, $3, $4, $5, 'planned')
            RETURNING id
            "#,
        )
        .bind(farm_id)
        .bind(certificate.id)
        .bind(format!("{} รอบที่ 1", herb_name))
        .bind(&herb_name)
        .bind(now.date_naive())
        .fetch_one(&mut *tx)
        .await?;

        // First harvest batch with its traceability QR token
        let farm_prefix: String = farm_id.simple().to_string()[..4].to_string();
        let batch_sequence = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) + 1 FROM harvest_batches WHERE farm_id = $1",
        )
        .bind(farm_id)
        .fetch_one(&mut *tx)
        .await?;

        let batch_number = format_batch_number(year, &farm_prefix, batch_sequence);
        let qr_code = Uuid::new_v4().simple().to_string();
        let track_url = tracking_url(&self.trace_base, &qr_code);

        let harvest_batch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO harvest_batches
                (batch_number, farm_id, cycle_id, status, qr_code, tracking_url)
            VALUES ($1, $2, $3, 'growing', $4, $5)
            RETURNING id
            "#,
        )
        .bind(&batch_number)
        .bind(farm_id)
        .bind(planting_cycle_id)
        .bind(&qr_code)
        .bind(&track_url)
        .fetch_one(&mut *tx)
        .await?;

        notification::notify_tx(
            &mut tx,
            farmer_id,
            Some(application_id),
            "ออกใบรับรองแล้ว",
            &format!(
                "คำขอ {} ได้รับใบรับรองเลขที่ {} (หมดอายุ {})",
                application_number,
                certificate_number,
                expires_at.format("%Y-%m-%d")
            ),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            certificate_number = %certificate.certificate_number,
            application_id = %application_id,
            "certificate issued"
        );

        Ok(IssuanceResponse {
            certificate,
            farm_id,
            planting_cycle_id,
            harvest_batch_id,
            batch_number,
            qr_code,
            tracking_url: track_url,
        })
    }

    /// Get one certificate. Farmers see only their own.
    pub async fn get(&self, id: Uuid, user: &AuthUser) -> AppResult<CertificateRow> {
        let certificate = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE id = $1 AND ($2 OR farmer_id = $3)
            "#
        ))
        .bind(id)
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Certificate".to_string()))?;

        Ok(certificate)
    }

    /// List certificates visible to the caller
    pub async fn list(
        &self,
        user: &AuthUser,
        pagination: Pagination,
    ) -> AppResult<Paginated<CertificateRow>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM certificates WHERE ($1 OR farmer_id = $2)",
        )
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE ($1 OR farmer_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user.is_staff())
        .bind(user.user_id)
        .bind(pagination.limit as i64)
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(Paginated::new(rows, &pagination, total))
    }

    /// Public verification by certificate number and printed code.
    /// Lazily expires certificates past their validity window and counts the
    /// lookup.
    pub async fn verify(&self, certificate_number: &str, code: &str) -> AppResult<VerificationView> {
        let row = sqlx::query_as::<_, (Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>, String, String, Option<String>, String)>(
            r#"
            SELECT c.id, c.certificate_number, c.verification_code, c.status,
                   c.issued_at, c.expires_at,
                   u.first_name || ' ' || u.last_name AS farmer_name,
                   f.name AS farm_name, f.province,
                   a.herb_name
            FROM certificates c
            JOIN users u ON u.id = c.farmer_id
            JOIN farms f ON f.id = c.farm_id
            JOIN applications a ON a.id = c.application_id
            WHERE c.certificate_number = $1
            "#,
        )
        .bind(certificate_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Certificate".to_string()))?;

        let (id, number, verification_code, mut status, issued_at, expires_at, farmer_name, farm_name, province, herb_name) =
            row;

        // A wrong code reveals nothing about the certificate
        if verification_code != code.to_uppercase() {
            return Err(AppError::NotFound("Certificate".to_string()));
        }

        if status == "active" && expires_at < Utc::now() {
            sqlx::query("UPDATE certificates SET status = 'expired', updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;
            status = "expired".to_string();
        }

        sqlx::query(
            "UPDATE certificates SET verification_count = verification_count + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(VerificationView {
            certificate_number: number,
            status,
            farmer_name,
            farm_name,
            province,
            herb_name,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_code_shape() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }
}
