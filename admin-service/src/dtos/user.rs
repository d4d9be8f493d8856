use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    models::{NewUser, UserChanges},
    utils::validation::{double_option, inner_str, length_between, require_any, TEXT_MAX_LENGTH},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(
        min = 2,
        max = 120,
        message = "firstName must be between 2 and 120 characters"
    ))]
    pub first_name: String,

    #[validate(length(

        min = 2,

        max = 120,

        message = "lastName must be between 2 and 120 characters"

    ))]
    pub last_name: String,

    #[validate(
        email(message = "email must be a valid email"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(max = 255, message = "phone must be at most 255 characters"))]
    pub phone: Option<String>,

    #[validate(length(

        min = 3,

        max = 120,

        message = "userName must be between 3 and 120 characters"

    ))]
    pub user_name: String,

    #[validate(length(

        min = 8,

        max = 255,

        message = "password must be between 8 and 255 characters"

    ))]
    pub password: String,

    #[serde(default)]
    pub super_admin: bool,
}

impl CreateUserRequest {
    /// Columns to insert, with the already hashed password.
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            user_name: self.user_name,
            password: password_hash,
            super_admin: self.super_admin,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_user_update"))]
pub struct UpdateUserRequest {
    #[validate(length(
        min = 2,
        max = 120,
        message = "firstName must be between 2 and 120 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(

        min = 2,

        max = 120,

        message = "lastName must be between 2 and 120 characters"

    ))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "email must be a valid email"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    #[validate(length(

        min = 3,

        max = 120,

        message = "userName must be between 3 and 120 characters"

    ))]
    pub user_name: Option<String>,

    #[validate(length(

        min = 8,

        max = 255,

        message = "password must be between 8 and 255 characters"

    ))]
    pub password: Option<String>,

    pub super_admin: Option<bool>,
}

fn validate_user_update(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    require_any(&[
        req.first_name.is_some(),
        req.last_name.is_some(),
        req.email.is_some(),
        req.phone.is_some(),
        req.user_name.is_some(),
        req.password.is_some(),
        req.super_admin.is_some(),
    ])?;
    length_between(inner_str(&req.phone), "phone", 0, Some(TEXT_MAX_LENGTH))
}

impl UpdateUserRequest {
    pub fn into_changes(self, password_hash: Option<String>) -> UserChanges {
        UserChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            user_name: self.user_name,
            password: password_hash,
            super_admin: self.super_admin,
        }
    }
}

/// Self-service profile edit. Only the fields below are ever read from the
/// payload; anything else, including `userName` and `superAdmin`, is dropped
/// during deserialisation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_profile_update"))]
pub struct UpdateProfileRequest {
    pub current_password: Option<String>,

    #[validate(length(

        min = 2,

        max = 120,

        message = "firstName must be between 2 and 120 characters"

    ))]
    pub first_name: Option<String>,

    #[validate(length(

        min = 2,

        max = 120,

        message = "lastName must be between 2 and 120 characters"

    ))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "email must be a valid email"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    #[validate(length(

        min = 8,

        max = 255,

        message = "password must be between 8 and 255 characters"

    ))]
    pub password: Option<String>,
}

fn validate_profile_update(req: &UpdateProfileRequest) -> Result<(), ValidationError> {
    length_between(inner_str(&req.phone), "phone", 0, Some(TEXT_MAX_LENGTH))
}

impl UpdateProfileRequest {
    /// Allow-list projection of the editable profile fields.
    pub fn into_changes(self, password_hash: Option<String>) -> UserChanges {
        UserChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            password: password_hash,
            ..UserChanges::default()
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "currentPassword is required"))]
    pub current_password: String,

    #[validate(length(

        min = 8,

        max = 255,

        message = "newPassword must be between 8 and 255 characters"

    ))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_user_update_rejected() {
        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_phone_null_counts_as_a_field() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.phone, Some(None));
    }

    #[test]
    fn test_profile_drops_privileged_fields() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"currentPassword":"pw","firstName":"Ada","userName":"root","superAdmin":true}"#,
        )
        .unwrap();

        let changes = req.into_changes(None);
        assert_eq!(changes.first_name.as_deref(), Some("Ada"));
        assert!(changes.user_name.is_none());
        assert!(changes.super_admin.is_none());
    }

    #[test]
    fn test_create_user_defaults_super_admin_false() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"firstName":"Ada","lastName":"Lovelace","email":"ada@example.org","userName":"ada","password":"password1"}"#,
        )
        .unwrap();
        assert!(!req.super_admin);
        assert!(req.validate().is_ok());
    }
}
