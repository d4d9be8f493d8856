use std::{borrow::Cow, collections::HashMap};

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use service_core::error::AppError;
use validator::{Validate, ValidateEmail, ValidateUrl, ValidationError};

/// Column width of the plain `VARCHAR(255)` fields.
pub const TEXT_MAX_LENGTH: usize = 255;

/// Column width of stored links.
pub const URL_MAX_LENGTH: usize = 2048;

/// JSON body that has passed `validator` checks. Malformed bodies and failed
/// rules are both rendered as 400 envelopes.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| {
                AppError::bad_request(format!("Invalid request body: {}", e.body_text()))
            })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Query string counterpart of [`ValidatedJson`].
pub struct ValidatedQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                AppError::bad_request(format!("Invalid query string: {}", e.body_text()))
            })?;

        value.validate()?;

        Ok(ValidatedQuery(value))
    }
}

/// Positive integer `:id` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub i32);

/// `:id` and `:member_id` of an event membership route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMemberIds {
    pub event_id: i32,
    pub member_id: i32,
}

async fn path_params<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
) -> Result<HashMap<String, String>, AppError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?;
    Ok(params)
}

fn positive_id(params: &HashMap<String, String>, key: &str, label: &str) -> Result<i32, AppError> {
    params
        .get(key)
        .and_then(|raw| raw.parse::<i32>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request(format!("{} must be a positive integer", label)))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await?;
        Ok(ResourceId(positive_id(&params, "id", "id")?))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for EventMemberIds
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await?;
        Ok(EventMemberIds {
            event_id: positive_id(&params, "id", "id")?,
            member_id: positive_id(&params, "member_id", "memberId")?,
        })
    }
}

/// Deserialize a present field (even `null`) as `Some(..)`, so that an
/// absent field stays `None` under `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub fn rule_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Accepts an absent or blank value, otherwise requires a URL.
pub fn blank_or_url(value: Option<&str>, field: &str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !is_blank(Some(v)) && !v.validate_url() => {
            Err(rule_error("url", format!("{} must be a valid URL", field)))
        }
        _ => Ok(()),
    }
}

/// Accepts an absent or blank value, otherwise requires an email address.
pub fn blank_or_email(value: Option<&str>, field: &str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !is_blank(Some(v)) && !v.validate_email() => {
            Err(rule_error("email", format!("{} must be a valid email", field)))
        }
        _ => Ok(()),
    }
}

/// Length bounds in characters; `None` passes.
pub fn length_between(
    value: Option<&str>,
    field: &str,
    min: usize,
    max: Option<usize>,
) -> Result<(), ValidationError> {
    let Some(v) = value else {
        return Ok(());
    };
    let len = v.chars().count();
    if len < min {
        return Err(rule_error(
            "length",
            format!("{} must be at least {} characters", field, min),
        ));
    }
    if let Some(max) = max {
        if len > max {
            return Err(rule_error(
                "length",
                format!("{} must be at most {} characters", field, max),
            ));
        }
    }
    Ok(())
}

/// Update payloads must name at least one field.
pub fn require_any(present: &[bool]) -> Result<(), ValidationError> {
    if present.iter().any(|p| *p) {
        Ok(())
    } else {
        Err(rule_error("empty_update", "At least one field must be provided"))
    }
}

/// Flatten a nested `Option<Option<String>>` to the inner string, if any.
pub fn inner_str(value: &Option<Option<String>>) -> Option<&str> {
    value.as_ref().and_then(|v| v.as_deref())
}
