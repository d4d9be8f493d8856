//! Self-service endpoints for the signed-in user.

use axum::extract::State;
use service_core::{error::AppError, response::ApiResponse};

use crate::dtos::{ChangePasswordRequest, UpdateProfileRequest};
use crate::middleware::AuthUser;
use crate::models::SanitizedUser;
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<SanitizedUser>, AppError> {
    let me = state.auth_service.current_user(user.id).await?;
    Ok(ApiResponse::ok("User retrieved successfully", me))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<ApiResponse<SanitizedUser>, AppError> {
    let updated = state.auth_service.update_profile(user.id, req).await?;
    Ok(ApiResponse::ok("Profile updated successfully", updated))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    state.auth_service.change_password(user.id, req).await?;
    Ok(ApiResponse::message("Password changed successfully"))
}
