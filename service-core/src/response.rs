//! Success envelope shared by every handler: `{respCode, message, data}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub resp_code: u16,
    pub message: String,
    pub data: Option<T>,
}

/// A successful response; `respCode` always mirrors the HTTP status.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ApiResponse<()> {
    /// 200 with `data: null`.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message, None)
    }

    /// 204; the body is dropped on the wire.
    pub fn no_content(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NO_CONTENT, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }

        (
            self.status,
            Json(Envelope {
                resp_code: self.status.as_u16(),
                message: self.message,
                data: self.data,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_created_mirrors_status_in_resp_code() {
        let res = ApiResponse::created("Member created successfully", serde_json::json!({"id": 7}))
            .into_response();
        assert_eq!(res.status(), StatusCode::CREATED);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["respCode"], 201);
        assert_eq!(body["message"], "Member created successfully");
        assert_eq!(body["data"]["id"], 7);
    }

    #[tokio::test]
    async fn test_message_only_has_null_data() {
        let res = ApiResponse::message("Password changed successfully").into_response();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["data"].is_null());
        assert_eq!(body["respCode"], 200);
    }

    #[tokio::test]
    async fn test_no_content_has_empty_body() {
        let res = ApiResponse::no_content("Event deleted successfully").into_response();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}
