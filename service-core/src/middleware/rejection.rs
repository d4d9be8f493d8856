use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{AppError, ErrorEnvelope};

/// Give bodiless error responses produced by the router itself (405 on a
/// known path, for one) the same envelope as handler errors.
pub async fn envelope_rejection_middleware(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error || response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let (parts, _) = response.into_parts();
    let mut enveloped = if status == StatusCode::METHOD_NOT_ALLOWED {
        AppError::MethodNotAllowed.into_response()
    } else {
        (
            status,
            Json(ErrorEnvelope {
                resp_code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Request failed").to_string(),
                data: None,
                details: None,
            }),
        )
            .into_response()
    };

    // Keep headers such as `Allow`, minus the stale length.
    for (name, value) in parts.headers.iter() {
        if *name != header::CONTENT_LENGTH {
            enveloped.headers_mut().entry(name).or_insert(value.clone());
        }
    }

    enveloped
}
