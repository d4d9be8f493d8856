use service_core::error::AppError;
use thiserror::Error;

use crate::db::StoreError;
use crate::dtos::event::END_BEFORE_START;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INVALID_RESET_TOKEN: &str = "Invalid reset token";
pub const RESET_TOKEN_REJECTED: &str = "Reset token is invalid or has expired";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token or email missing from a reset call.
    #[error("Invalid reset token")]
    MissingResetToken,

    /// Wrong token, wrong email or expired ticket; deliberately one variant.
    #[error("Reset token is invalid or has expired")]
    ResetTokenRejected,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Email error: {0}")]
    Email(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CheckViolation { ref constraint }
                if constraint == "events_end_after_start" =>
            {
                ServiceError::BadRequest(END_BEFORE_START.to_string())
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::from(StoreError::from(err))
    }
}

impl ServiceError {
    /// Map a unique violation to a conflict with `message`; other store
    /// errors pass through.
    pub fn conflict_on_unique(err: StoreError, message: &str) -> Self {
        if err.is_unique_violation() {
            ServiceError::Conflict(message.to_string())
        } else {
            ServiceError::from(err)
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(StoreError::UniqueViolation { constraint }) => {
                AppError::conflict(format!("Duplicate value violates {}", constraint))
            }
            ServiceError::Store(StoreError::ForeignKeyViolation { constraint }) => {
                AppError::bad_request(format!("Referenced record does not exist ({})", constraint))
            }
            ServiceError::Store(StoreError::CheckViolation { constraint }) => {
                AppError::bad_request(format!("Value violates {}", constraint))
            }
            ServiceError::Store(StoreError::Other(e)) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => AppError::unauthorized(INVALID_CREDENTIALS),
            ServiceError::MissingResetToken => AppError::bad_request(INVALID_RESET_TOKEN),
            ServiceError::ResetTokenRejected => AppError::bad_request(RESET_TOKEN_REJECTED),
            ServiceError::BadRequest(msg) => AppError::bad_request(msg),
            ServiceError::NotFound(msg) => AppError::not_found(msg),
            ServiceError::Conflict(msg) => AppError::conflict(msg),
            ServiceError::Email(e) => e,
        }
    }
}
