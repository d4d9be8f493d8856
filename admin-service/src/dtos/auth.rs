use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::SanitizedUser;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "userName is required"))]
    pub user_name: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Token plus the signed-in user, returned by login and reset completion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: SanitizedUser,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
}

/// Both parameters are optional so that a missing one yields the reset
/// error message rather than a generic query rejection.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResetTokenQuery {
    pub token: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,

    #[validate(email(message = "email must be a valid email"))]
    pub email: String,

    #[serde(alias = "newPassword")]
    #[validate(length(
        min = 8,
        max = 255,
        message = "password must be between 8 and 255 characters"
    ))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_request_accepts_new_password_alias() {
        let req: ResetPasswordRequest = serde_json::from_str(
            r#"{"token":"abc","email":"a@example.org","newPassword":"longenough"}"#,
        )
        .unwrap();
        assert_eq!(req.password, "longenough");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_short_reset_password_rejected() {
        let req = ResetPasswordRequest {
            token: "abc".to_string(),
            email: "a@example.org".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
