use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::AppState;

/// Identity of the caller, resolved from the token and the credential store.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub super_admin: bool,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware to require authentication
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::unauthorized("Missing or invalid Authorization header"))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken(e)
    })?;

    // Tokens outlive deleted accounts; the store has the final word.
    let user = state
        .store
        .find_by_id(claims.id)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?
        .ok_or_else(|| {
            tracing::warn!(user_id = claims.id, "Token for unknown user");
            AppError::unauthorized("User no longer exists")
        })?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        user_name: user.user_name,
        email: user.email,
        super_admin: user.super_admin,
    });

    Ok(next.run(req).await)
}

/// Extractor to easily get the caller in handlers
pub struct AuthUser(pub CurrentUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
