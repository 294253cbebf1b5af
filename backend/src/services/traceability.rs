//! Public traceability: resolve a harvest batch QR code to its provenance

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Traceability service
#[derive(Clone)]
pub struct TraceabilityService {
    db: PgPool,
}

/// Public provenance view for a scanned batch
#[derive(Debug, Serialize)]
pub struct TraceView {
    pub batch: TraceBatch,
    pub cycle: TraceCycle,
    pub farm: TraceFarm,
    pub certificate: Option<TraceCertificate>,
}

#[derive(Debug, Serialize)]
pub struct TraceBatch {
    pub batch_number: String,
    pub status: String,
    pub planting_date: Option<NaiveDate>,
    pub harvest_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct TraceCycle {
    pub name: String,
    pub crop_name: String,
    pub start_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct TraceFarm {
    pub name: String,
    pub province: Option<String>,
    pub is_verified: bool,
}

#[derive(Debug, Serialize)]
pub struct TraceCertificate {
    pub certificate_number: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct TraceRowFlat {
    batch_number: String,
    batch_status: String,
    planting_date: Option<NaiveDate>,
    harvest_date: Option<NaiveDate>,
    cycle_name: String,
    crop_name: String,
    start_date: NaiveDate,
    cycle_status: String,
    farm_name: String,
    province: Option<String>,
    is_verified: bool,
    certificate_number: Option<String>,
    certificate_status: Option<String>,
    certificate_expires_at: Option<DateTime<Utc>>,
}

impl TraceabilityService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve a QR token or batch number to the provenance chain.
    /// This endpoint is unauthenticated - accessible via QR code scan.
    pub async fn trace(&self, code: &str) -> AppResult<TraceView> {
        let row = sqlx::query_as::<_, TraceRowFlat>(
            r#"
            SELECT hb.batch_number,
                   hb.status AS batch_status,
                   hb.planting_date,
                   hb.harvest_date,
                   pc.name AS cycle_name,
                   pc.crop_name,
                   pc.start_date,
                   pc.status AS cycle_status,
                   f.name AS farm_name,
                   f.province,
                   f.is_verified,
                   c.certificate_number,
                   c.status AS certificate_status,
                   c.expires_at AS certificate_expires_at
            FROM harvest_batches hb
            JOIN planting_cycles pc ON pc.id = hb.cycle_id
            JOIN farms f ON f.id = hb.farm_id
            LEFT JOIN certificates c ON c.id = pc.certificate_id
            WHERE hb.qr_code = $1 OR hb.batch_number = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        let certificate = match (
            row.certificate_number,
            row.certificate_status,
            row.certificate_expires_at,
        ) {
            (Some(number), Some(status), Some(expires_at)) => Some(TraceCertificate {
                certificate_number: number,
                status,
                expires_at,
            }),
            _ => None,
        };

        Ok(TraceView {
            batch: TraceBatch {
                batch_number: row.batch_number,
                status: row.batch_status,
                planting_date: row.planting_date,
                harvest_date: row.harvest_date,
            },
            cycle: TraceCycle {
                name: row.cycle_name,
                crop_name: row.crop_name,
                start_date: row.start_date,
                status: row.cycle_status,
            },
            farm: TraceFarm {
                name: row.farm_name,
                province: row.province,
                is_verified: row.is_verified,
            },
            certificate,
        })
    }
}
