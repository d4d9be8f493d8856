use axum::extract::State;
use service_core::{error::AppError, response::ApiResponse};

use crate::dtos::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, ResetTokenQuery,
};
use crate::utils::{ValidatedJson, ValidatedQuery};
use crate::AppState;

/// Sent whether or not the address belongs to an account.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(ApiResponse::ok("Login successful", response))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    state.auth_service.request_password_reset(&req.email).await?;
    Ok(ApiResponse::message(FORGOT_PASSWORD_MESSAGE))
}

pub async fn validate_reset_token(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ResetTokenQuery>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .auth_service
        .validate_reset_token(query.token.as_deref(), query.email.as_deref())
        .await?;
    Ok(ApiResponse::message("Reset token is valid"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let response = state.auth_service.complete_password_reset(req).await?;
    Ok(ApiResponse::ok("Password reset successful", response))
}
