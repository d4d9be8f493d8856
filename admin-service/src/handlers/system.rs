use axum::http::header;
use axum::response::IntoResponse;
use service_core::{
    error::AppError, observability::metrics::render_metrics, response::ApiResponse,
};

pub async fn health() -> ApiResponse<serde_json::Value> {
    ApiResponse::ok("OK", serde_json::json!({ "status": "healthy" }))
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(),
    )
}

pub async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}
