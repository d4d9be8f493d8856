use axum::{extract::Request, middleware::Next, response::Response};
use service_core::error::AppError;

use super::auth::CurrentUser;

/// Runs after [`super::auth_middleware`]; lets only super administrators through.
pub async fn require_super_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    if !user.super_admin {
        tracing::warn!(user_id = user.id, path = %req.uri().path(), "Super admin route denied");
        return Err(AppError::forbidden("Super admin access required"));
    }

    Ok(next.run(req).await)
}
