//! User administration, mounted behind the super admin gate.

use axum::extract::State;
use service_core::{error::AppError, response::ApiResponse};

use crate::dtos::{CreateUserRequest, UpdateUserRequest};
use crate::models::SanitizedUser;
use crate::utils::{ResourceId, ValidatedJson};
use crate::AppState;

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<SanitizedUser>>, AppError> {
    let users = state.user_service.list().await?;
    Ok(ApiResponse::ok("Users retrieved successfully", users))
}

pub async fn get_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<ApiResponse<SanitizedUser>, AppError> {
    let user = state.user_service.get(id).await?;
    Ok(ApiResponse::ok("User retrieved successfully", user))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<ApiResponse<SanitizedUser>, AppError> {
    let user = state.user_service.create(req).await?;
    Ok(ApiResponse::created("User created successfully", user))
}

pub async fn update_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<ApiResponse<SanitizedUser>, AppError> {
    let user = state.user_service.update(id, req).await?;
    Ok(ApiResponse::ok("User updated successfully", user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<ApiResponse<()>, AppError> {
    state.user_service.delete(id).await?;
    Ok(ApiResponse::no_content("User deleted successfully"))
}
