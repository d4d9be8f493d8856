//! Administrator account.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Full `users` row, including credential columns. Never serialised directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_name: String,
    pub password: String,
    pub super_admin: bool,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Client-safe view without the password hash or reset ticket.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser::from(self.clone())
    }
}

/// A user as returned to clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_name: String,
    pub super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for SanitizedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            user_name: user.user_name,
            super_admin: user.super_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Columns written when a user is created. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_name: String,
    pub password: String,
    pub super_admin: bool,
}

/// Partial update of a user. `phone: Some(None)` clears the column.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub super_admin: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_user_has_no_secrets() {
        let now = Utc::now();
        let user = User {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Admin".to_string(),
            email: "ada@example.org".to_string(),
            phone: None,
            user_name: "ada".to_string(),
            password: "$2b$10$hash".to_string(),
            super_admin: true,
            reset_token: Some("abc".to_string()),
            reset_token_expires: Some(now),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(user.sanitized()).unwrap();
        assert_eq!(json["userName"], "ada");
        assert_eq!(json["superAdmin"], true);
        assert!(json.get("password").is_none());
        assert!(json.get("resetToken").is_none());
        assert!(json.get("resetTokenExpires").is_none());
    }
}
