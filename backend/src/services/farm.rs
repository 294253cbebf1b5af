//! Farm management: farmer-owned farms, planting cycles, and harvest batches

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use shared::models::CultivationMethod;
use shared::types::{Paginated, Pagination};
use shared::validation;

/// Farm service
#[derive(Clone)]
pub struct FarmService {
    db: PgPool,
}

/// Input for registering a farm
#[derive(Debug, Deserialize)]
pub struct CreateFarmInput {
    pub name: String,
    pub address: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub postal_code: Option<String>,
    pub total_area_rai: Decimal,
    pub cultivation_area_rai: Decimal,
    pub cultivation_method: Option<CultivationMethod>,
}

/// Input for updating a farm
#[derive(Debug, Deserialize)]
pub struct UpdateFarmInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub postal_code: Option<String>,
    pub total_area_rai: Option<Decimal>,
    pub cultivation_area_rai: Option<Decimal>,
    pub cultivation_method: Option<CultivationMethod>,
}

/// A farm row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FarmRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub postal_code: Option<String>,
    pub total_area_rai: Decimal,
    pub cultivation_area_rai: Decimal,
    pub cultivation_method: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A planting cycle row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PlantingCycleRow {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub certificate_id: Option<Uuid>,
    pub name: String,
    pub crop_name: String,
    pub start_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A harvest batch row
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct HarvestBatchRow {
    pub id: Uuid,
    pub batch_number: String,
    pub farm_id: Uuid,
    pub cycle_id: Uuid,
    pub planting_date: Option<NaiveDate>,
    pub harvest_date: Option<NaiveDate>,
    pub status: String,
    pub qr_code: String,
    pub tracking_url: String,
    pub created_at: DateTime<Utc>,
}

const FARM_COLUMNS: &str = r#"
    id, owner_id, name, address, province, district, subdistrict, postal_code,
    total_area_rai, cultivation_area_rai, cultivation_method, is_verified,
    created_at, updated_at
"#;

impl FarmService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a farm for the calling farmer
    pub async fn create(&self, user: &AuthUser, input: CreateFarmInput) -> AppResult<FarmRow> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Farm name is required".to_string(),
                message_th: "กรุณาระบุชื่อแปลงปลูก".to_string(),
            });
        }
        if let Err(msg) = validation::validate_cultivation_area(input.cultivation_area_rai) {
            return Err(AppError::Validation {
                field: "cultivation_area_rai".to_string(),
                message: msg.to_string(),
                message_th: "พื้นที่เพาะปลูกไม่ถูกต้อง".to_string(),
            });
        }
        if input.cultivation_area_rai > input.total_area_rai {
            return Err(AppError::Validation {
                field: "cultivation_area_rai".to_string(),
                message: "Cultivation area cannot exceed total area".to_string(),
                message_th: "พื้นที่เพาะปลูกต้องไม่เกินพื้นที่ทั้งหมด".to_string(),
            });
        }
        if let Some(code) = &input.postal_code {
            if let Err(msg) = validation::validate_thai_postal_code(code) {
                return Err(AppError::Validation {
                    field: "postal_code".to_string(),
                    message: msg.to_string(),
                    message_th: "รหัสไปรษณีย์ไม่ถูกต้อง".to_string(),
                });
            }
        }

        let farm = sqlx::query_as::<_, FarmRow>(&format!(
            r#"
            INSERT INTO farms
                (owner_id, name, address, province, district, subdistrict, postal_code,
                 total_area_rai, cultivation_area_rai, cultivation_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {FARM_COLUMNS}
            "#
        ))
        .bind(user.user_id)
        .bind(input.name.trim())
        .bind(&input.address)
        .bind(&input.province)
        .bind(&input.district)
        .bind(&input.subdistrict)
        .bind(&input.postal_code)
        .bind(input.total_area_rai)
        .bind(input.cultivation_area_rai)
        .bind(input.cultivation_method.map(|m| m.as_str()))
        .fetch_one(&self.db)
        .await?;

        Ok(farm)
    }

    /// Get one farm. Farmers see only their own.
    pub async fn get(&self, id: Uuid, user: &AuthUser) -> AppResult<FarmRow> {
        let farm = sqlx::query_as::<_, FarmRow>(&format!(
            r#"
            SELECT {FARM_COLUMNS}
            FROM farms
            WHERE id = $1 AND ($2 OR owner_id = $3)
            "#
        ))
        .bind(id)
        .bind(user.is_staff())
        .bind(user.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farm".to_string()))?;

        Ok(farm)
    }

    /// List farms visible to the caller
    pub async fn list(
        &self,
        user: &AuthUser,
        pagination: Pagination,
    ) -> AppResult<Paginated<FarmRow>> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM farms WHERE ($1 OR owner_id = $2)")
                .bind(user.is_staff())
                .bind(user.user_id)
                .fetch_one(&self.db)
                .await?;

        let rows = sqlx::query_as::<_, FarmRow>(&format!(
            r#"
            SELECT {FARM_COLUMNS}
            FROM farms
            WHERE ($1 OR owner_id = $2)
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

    /// Update a farm the caller owns
    pub async fn update(&self, id: Uuid, user: &AuthUser, input: UpdateFarmInput) -> AppResult<FarmRow> {
        // Ownership check; staff may correct any farm
        let farm = self.get(id, user).await?;

        if let Some(area) = input.cultivation_area_rai {
            if let Err(msg) = validation::validate_cultivation_area(area) {
                return Err(AppError::Validation {
                    field: "cultivation_area_rai".to_string(),
                    message: msg.to_string(),
                    message_th: "พื้นที่เพาะปลูกไม่ถูกต้อง".to_string(),
                });
            }
        }

        let updated = sqlx::query_as::<_, FarmRow>(&format!(
            r#"
            UPDATE farms
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                province = COALESCE($4, province),
                district = COALESCE($5, district),
                subdistrict = COALESCE($6, subdistrict),
                postal_code = COALESCE($7, postal_code),
                total_area_rai = COALESCE($8, total_area_rai),
                cultivation_area_rai = COALESCE($9, cultivation_area_rai),
                cultivation_method = COALESCE($10, cultivation_method),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {FARM_COLUMNS}
            "#
        ))
        .bind(farm.id)
        .bind(input.name)
        .bind(input.address)
        .bind(input.province)
        .bind(input.district)
        .bind(input.subdistrict)
        .bind(input.postal_code)
        .bind(input.total_area_rai)
        .bind(input.cultivation_area_rai)
        .bind(input.cultivation_method.map(|m| m.as_str()))
        .fetch_one(&self.db)
        .await?;

        Ok(updated)
    }

    /// Planting cycles for a farm
    pub async fn cycles(&self, farm_id: Uuid, user: &AuthUser) -> AppResult<Vec<PlantingCycleRow>> {
        let farm = self.get(farm_id, user).await?;

        let cycles = sqlx::query_as::<_, PlantingCycleRow>(
            r#"
            SELECT id, farm_id, certificate_id, name, crop_name, start_date, status, created_at
            FROM planting_cycles
            WHERE farm_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(farm.id)
        .fetch_all(&self.db)
        .await?;

        Ok(cycles)
    }

    /// Harvest batches for a farm
    pub async fn batches(&self, farm_id: Uuid, user: &AuthUser) -> AppResult<Vec<HarvestBatchRow>> {
        let farm = self.get(farm_id, user).await?;

        let batches = sqlx::query_as::<_, HarvestBatchRow>(
            r#"
            SELECT id, batch_number, farm_id, cycle_id, planting_date, harvest_date,
                   status, qr_code, tracking_url, created_at
            FROM harvest_batches
            WHERE farm_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(farm.id)
        .fetch_all(&self.db)
        .await?;

        Ok(batches)
    }
}
