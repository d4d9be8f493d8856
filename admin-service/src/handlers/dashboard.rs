use axum::extract::State;
use service_core::{error::AppError, response::ApiResponse};

use crate::dtos::{DashboardQuery, DashboardStats};
use crate::utils::ValidatedQuery;
use crate::AppState;

pub async fn stats(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<DashboardQuery>,
) -> Result<ApiResponse<DashboardStats>, AppError> {
    let stats = state.dashboard.stats(query.range).await?;
    Ok(ApiResponse::ok("Dashboard stats retrieved successfully", stats))
}
