use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Whether error bodies may carry internal detail. Off unless the service
/// opts in at start-up, so an unconfigured process never leaks internals.
static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Enable or disable the `details` field on error bodies (non-production only).
pub fn expose_error_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

pub fn error_details_exposed() -> bool {
    EXPOSE_DETAILS.load(Ordering::Relaxed)
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(anyhow::anyhow!(message.into()))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(anyhow::anyhow!(message.into()))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(anyhow::anyhow!(message.into()))
    }

    /// HTTP status this error is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::EmailError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Flatten validator errors into one readable line, ordered by field name.
pub fn summarize_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let text = match &err.message {
                    Some(message) => message.to_string(),
                    None if field == "__all__" => format!("invalid payload ({})", err.code),
                    None => format!("{} is invalid ({})", field, err.code),
                };
                (field.clone(), text)
            })
        })
        .collect();

    fields.sort();

    if fields.is_empty() {
        return "Invalid request payload".to_string();
    }

    fields
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Body of every failed response: `{respCode, message, data: null}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub resp_code: u16,
    pub message: String,
    pub data: Option<()>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                summarize_validation_errors(&err),
                Some(format!("{:?}", err)),
                None,
            ),
            AppError::BadRequest(err) => (err.to_string(), None, None),
            AppError::NotFound(err) => (err.to_string(), None, None),
            AppError::Unauthorized(err) => (err.to_string(), None, None),
            AppError::Forbidden(err) => (err.to_string(), None, None),
            AppError::Conflict(err) => (err.to_string(), None, None),
            AppError::TooManyRequests(msg, retry) => (msg, None, retry),
            AppError::InternalError(err) => (
                "Internal server error".to_string(),
                Some(format!("{:#}", err)),
                None,
            ),
            AppError::MethodNotAllowed => ("Method not allowed".to_string(), None, None),
            AppError::DatabaseError(err) => (
                "Database error".to_string(),
                Some(format!("{:#}", err)),
                None,
            ),
            AppError::InvalidToken(err) => (
                "Invalid or expired token".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::EmailError(msg) => ("Email delivery failed".to_string(), Some(msg), None),
            AppError::ConfigError(err) => (
                "Configuration error".to_string(),
                Some(err.to_string()),
                None,
            ),
        };

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                message = %message,
                details = ?details,
                "Request failed"
            );
        }

        let details = if error_details_exposed() { details } else { None };

        let mut res = (
            status,
            Json(ErrorEnvelope {
                resp_code: status.as_u16(),
                message,
                data: None,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 2, message = "name must be at least 2 characters"))]
        name: String,
        #[validate(email(message = "email must be a valid email"))]
        email: String,
    }

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    #[tokio::test]
    async fn test_not_found_renders_envelope() {
        let res = AppError::not_found("Member not found").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let body = body_json(res).await;
        assert_eq!(body["respCode"], 404);
        assert_eq!(body["message"], "Member not found");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_validation_error_is_bad_request() {
        let sample = Sample {
            name: "a".to_string(),
            email: "not-an-email".to_string(),
        };
        let err = sample.validate().unwrap_err();

        let res = AppError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = body_json(res).await;
        assert_eq!(body["respCode"], 400);
        assert_eq!(
            body["message"],
            "email must be a valid email; name must be at least 2 characters"
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause_in_message() {
        let res = AppError::InternalError(anyhow::anyhow!("pool timed out")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(res).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_too_many_requests_sets_retry_after() {
        let res = AppError::TooManyRequests("slow down".to_string(), Some(30)).into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            res.headers().get(axum::http::header::RETRY_AFTER).unwrap(),
            "30"
        );
    }
}
