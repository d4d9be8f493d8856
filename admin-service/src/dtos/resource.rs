use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    models::ResourceType,
    utils::validation::{
        blank_or_url, double_option, inner_str, length_between, require_any, URL_MAX_LENGTH,
    },
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_resource_create"))]
pub struct CreateResourceRequest {
    #[validate(length(min = 2, max = 255, message = "name must be between 2 and 255 characters"))]
    pub name: String,

    pub picture: Option<String>,

    #[validate(
        url(message = "link must be a valid URL"),
        length(max = 2048, message = "link must be at most 2048 characters")
    )]
    pub link: String,

    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

fn validate_resource_create(req: &CreateResourceRequest) -> Result<(), ValidationError> {
    picture_field(req.picture.as_deref())
}

fn picture_field(picture: Option<&str>) -> Result<(), ValidationError> {
    blank_or_url(picture, "picture")?;
    length_between(picture, "picture", 0, Some(URL_MAX_LENGTH))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_resource_update"))]
pub struct UpdateResourceRequest {
    #[validate(length(min = 2, max = 255, message = "name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub picture: Option<Option<String>>,

    #[validate(
        url(message = "link must be a valid URL"),
        length(max = 2048, message = "link must be at most 2048 characters")
    )]
    pub link: Option<String>,

    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
}

fn validate_resource_update(req: &UpdateResourceRequest) -> Result<(), ValidationError> {
    require_any(&[
        req.name.is_some(),
        req.picture.is_some(),
        req.link.is_some(),
        req.resource_type.is_some(),
    ])?;
    picture_field(inner_str(&req.picture))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource_type_fails_to_parse() {
        let parsed: Result<CreateResourceRequest, _> = serde_json::from_str(
            r#"{"name":"Gospel","link":"https://example.org","type":"magazine"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_resource_link_must_be_url() {
        let req: CreateResourceRequest = serde_json::from_str(
            r#"{"name":"Gospel","link":"nope","type":"book"}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_resource_create_ok() {
        let req: CreateResourceRequest = serde_json::from_str(
            r#"{"name":"Gospel Hour","picture":null,"link":"https://example.org/pod","type":"podcast"}"#,
        )
        .unwrap();
        assert_eq!(req.resource_type, ResourceType::Podcast);
        assert!(req.validate().is_ok());
    }
}
