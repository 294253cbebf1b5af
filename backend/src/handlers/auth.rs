//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::auth::{RegisterFarmerInput, RegisterResponse, RegisterStaffInput, UserProfile};
use crate::services::AuthService;
use crate::AppState;
use shared::models::UserRole;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct StaffCreatedResponse {
    pub user_id: String,
}

/// Farmer self-registration endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterFarmerInput>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.register_farmer(body).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Staff account creation endpoint handler (admin only)
pub async fn register_staff(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RegisterStaffInput>,
) -> Result<(StatusCode, Json<StaffCreatedResponse>), AppError> {
    user.require_role(&[UserRole::Admin])?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let user_id = auth_service.register_staff(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(StaffCreatedResponse {
            user_id: user_id.to_string(),
        }),
    ))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(&body.email, &body.password).await?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
    }))
}

/// Token refresh endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.refresh_token(&body.refresh_token).await?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
    }))
}

/// Current user profile endpoint handler
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let profile = auth_service.me(user.user_id).await?;

    Ok(Json(profile))
}
