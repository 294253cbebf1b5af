//! HTTP handlers for farms, planting cycles, and harvest batches

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::farm::{
    CreateFarmInput, FarmRow, HarvestBatchRow, PlantingCycleRow, UpdateFarmInput,
};
use crate::services::FarmService;
use crate::AppState;
use shared::types::{Paginated, Pagination};

#[derive(Debug, Deserialize)]
pub struct FarmListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Register a farm
pub async fn create_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateFarmInput>,
) -> AppResult<(StatusCode, Json<FarmRow>)> {
    let service = FarmService::new(state.db);
    let farm = service.create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(farm)))
}

/// List farms visible to the caller
pub async fn list_farms(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<FarmListQuery>,
) -> AppResult<Json<Paginated<FarmRow>>> {
    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        limit: query.limit.unwrap_or(default.limit).min(100),
    };

    let service = FarmService::new(state.db);
    let page = service.list(&user, pagination).await?;
    Ok(Json(page))
}

/// Get one farm
pub async fn get_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FarmRow>> {
    let service = FarmService::new(state.db);
    let farm = service.get(id, &user).await?;
    Ok(Json(farm))
}

/// Update a farm
pub async fn update_farm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateFarmInput>,
) -> AppResult<Json<FarmRow>> {
    let service = FarmService::new(state.db);
    let farm = service.update(id, &user, body).await?;
    Ok(Json(farm))
}

/// Planting cycles for a farm
pub async fn list_farm_cycles(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<PlantingCycleRow>>> {
    let service = FarmService::new(state.db);
    let cycles = service.cycles(id, &user).await?;
    Ok(Json(cycles))
}

/// Harvest batches for a farm
pub async fn list_farm_batches(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<HarvestBatchRow>>> {
    let service = FarmService::new(state.db);
    let batches = service.batches(id, &user).await?;
    Ok(Json(batches))
}
