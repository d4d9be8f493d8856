use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::utils::validation::require_any;

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    #[validate(length(
        min = 2,
        max = 255,
        message = "firstName must be between 2 and 255 characters"
    ))]
    pub first_name: String,

    #[validate(length(

        min = 2,

        max = 255,

        message = "lastName must be between 2 and 255 characters"

    ))]
    pub last_name: String,

    #[validate(
        email(message = "email must be a valid email"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: String,

    pub join_date: NaiveDate,

    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_member_update"))]
pub struct UpdateMemberRequest {
    #[validate(length(
        min = 2,
        max = 255,
        message = "firstName must be between 2 and 255 characters"
    ))]
    pub first_name: Option<String>,

    #[validate(length(

        min = 2,

        max = 255,

        message = "lastName must be between 2 and 255 characters"

    ))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "email must be a valid email"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: Option<String>,

    pub join_date: Option<NaiveDate>,

    pub active: Option<bool>,
}

fn validate_member_update(req: &UpdateMemberRequest) -> Result<(), ValidationError> {
    require_any(&[
        req.first_name.is_some(),
        req.last_name.is_some(),
        req.email.is_some(),
        req.join_date.is_some(),
        req.active.is_some(),
    ])
}
