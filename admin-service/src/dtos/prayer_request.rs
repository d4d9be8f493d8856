use chrono::NaiveDate;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::utils::validation::require_any;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrayerRequestRequest {
    #[validate(length(min = 3, message = "content must be at least 3 characters"))]
    pub content: String,

    /// Defaults to today when omitted.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_prayer_request_update"))]
pub struct UpdatePrayerRequestRequest {
    #[validate(length(min = 3, message = "content must be at least 3 characters"))]
    pub content: Option<String>,

    pub date: Option<NaiveDate>,
}

fn validate_prayer_request_update(req: &UpdatePrayerRequestRequest) -> Result<(), ValidationError> {
    require_any(&[req.content.is_some(), req.date.is_some()])
}
