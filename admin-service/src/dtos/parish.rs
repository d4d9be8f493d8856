use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::utils::validation::{
    blank_or_email, blank_or_url, double_option, inner_str, length_between, require_any,
    rule_error, TEXT_MAX_LENGTH, URL_MAX_LENGTH,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_parish_create"))]
pub struct CreateParishRequest {
    #[validate(length(min = 2, max = 255, message = "name must be between 2 and 255 characters"))]
    pub name: String,

    pub address: Option<String>,

    pub phone: Option<String>,

    pub email: Option<String>,

    pub website: Option<String>,

    pub mass_schedule: Option<serde_json::Value>,

    pub confession_schedule: Option<serde_json::Value>,
}

fn schedule_object(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<(), ValidationError> {
    match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Object(_)) => Ok(()),
        Some(_) => Err(rule_error("object", format!("{} must be an object", field))),
    }
}

fn validate_parish_fields(
    address: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    website: Option<&str>,
    mass_schedule: Option<&serde_json::Value>,
    confession_schedule: Option<&serde_json::Value>,
) -> Result<(), ValidationError> {
    length_between(address, "address", 0, Some(500))?;
    length_between(phone, "phone", 0, Some(50))?;
    blank_or_email(email, "email")?;
    length_between(email, "email", 0, Some(TEXT_MAX_LENGTH))?;
    blank_or_url(website, "website")?;
    length_between(website, "website", 0, Some(URL_MAX_LENGTH))?;
    schedule_object(mass_schedule, "massSchedule")?;
    schedule_object(confession_schedule, "confessionSchedule")
}

fn validate_parish_create(req: &CreateParishRequest) -> Result<(), ValidationError> {
    validate_parish_fields(
        req.address.as_deref(),
        req.phone.as_deref(),
        req.email.as_deref(),
        req.website.as_deref(),
        req.mass_schedule.as_ref(),
        req.confession_schedule.as_ref(),
    )
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_parish_update"))]
pub struct UpdateParishRequest {
    #[validate(length(min = 2, max = 255, message = "name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub mass_schedule: Option<Option<serde_json::Value>>,

    #[serde(default, deserialize_with = "double_option")]
    pub confession_schedule: Option<Option<serde_json::Value>>,
}

fn validate_parish_update(req: &UpdateParishRequest) -> Result<(), ValidationError> {
    require_any(&[
        req.name.is_some(),
        req.address.is_some(),
        req.phone.is_some(),
        req.email.is_some(),
        req.website.is_some(),
        req.mass_schedule.is_some(),
        req.confession_schedule.is_some(),
    ])?;

    validate_parish_fields(
        inner_str(&req.address),
        inner_str(&req.phone),
        inner_str(&req.email),
        inner_str(&req.website),
        req.mass_schedule.as_ref().and_then(|v| v.as_ref()),
        req.confession_schedule.as_ref().and_then(|v| v.as_ref()),
    )
}
