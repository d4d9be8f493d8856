use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::utils::validation::{
    blank_or_url, double_option, inner_str, length_between, require_any, rule_error,
    TEXT_MAX_LENGTH, URL_MAX_LENGTH,
};

pub const END_BEFORE_START: &str = "endDateTime must be greater than or equal to startDateTime";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_event_create"))]
pub struct CreateEventRequest {
    #[validate(length(min = 3, max = 255, message = "name must be between 3 and 255 characters"))]
    pub name: String,

    pub start_date_time: DateTime<Utc>,

    pub end_date_time: DateTime<Utc>,

    pub picture_link: Option<String>,

    pub description: Option<String>,

    pub location: Option<String>,
}

fn validate_event_create(req: &CreateEventRequest) -> Result<(), ValidationError> {
    if req.end_date_time < req.start_date_time {
        return Err(rule_error("date_order", END_BEFORE_START));
    }
    event_text_fields(req.picture_link.as_deref(), req.location.as_deref())
}

fn event_text_fields(
    picture_link: Option<&str>,
    location: Option<&str>,
) -> Result<(), ValidationError> {
    blank_or_url(picture_link, "pictureLink")?;
    length_between(picture_link, "pictureLink", 0, Some(URL_MAX_LENGTH))?;
    length_between(location, "location", 0, Some(TEXT_MAX_LENGTH))
}

/// Partial event update. Nullable columns use `Option<Option<_>>`: absent
/// leaves the column alone, `null` clears it.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_event_update"))]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, max = 255, message = "name must be between 3 and 255 characters"))]
    pub name: Option<String>,

    pub start_date_time: Option<DateTime<Utc>>,

    pub end_date_time: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "double_option")]
    pub picture_link: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
}

fn validate_event_update(req: &UpdateEventRequest) -> Result<(), ValidationError> {
    require_any(&[
        req.name.is_some(),
        req.start_date_time.is_some(),
        req.end_date_time.is_some(),
        req.picture_link.is_some(),
        req.description.is_some(),
        req.location.is_some(),
    ])?;

    if let (Some(start), Some(end)) = (req.start_date_time, req.end_date_time) {
        if end < start {
            return Err(rule_error("date_order", END_BEFORE_START));
        }
    }

    event_text_fields(inner_str(&req.picture_link), inner_str(&req.location))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddEventMemberRequest {
    #[validate(range(min = 1, message = "memberId must be a positive integer"))]
    pub member_id: i32,
}
