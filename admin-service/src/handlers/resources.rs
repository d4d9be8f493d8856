//! Handlers shared by every [`Repository`] backed collection.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use service_core::{error::AppError, response::ApiResponse};

use crate::services::Repository;
use crate::utils::{ResourceId, ValidatedJson};

/// `GET/POST /` and `GET/PUT/DELETE /:id` for one collection. The caller
/// nests the router and supplies the repository as its state.
pub fn crud_routes<R: Repository>() -> Router<Arc<R>> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/:id", get(fetch::<R>).put(update::<R>).delete(remove::<R>))
}

pub async fn list<R: Repository>(
    State(repo): State<Arc<R>>,
) -> Result<ApiResponse<Vec<R::Entity>>, AppError> {
    let items = repo.list().await?;
    Ok(ApiResponse::ok(format!("{} retrieved successfully", R::PLURAL), items))
}

pub async fn fetch<R: Repository>(
    State(repo): State<Arc<R>>,
    ResourceId(id): ResourceId,
) -> Result<ApiResponse<R::Entity>, AppError> {
    let item = repo.get(id).await?.ok_or_else(R::not_found)?;
    Ok(ApiResponse::ok(format!("{} retrieved successfully", R::SINGULAR), item))
}

pub async fn create<R: Repository>(
    State(repo): State<Arc<R>>,
    ValidatedJson(input): ValidatedJson<R::Create>,
) -> Result<ApiResponse<R::Entity>, AppError> {
    let item = repo.create(input).await?;
    Ok(ApiResponse::created(format!("{} created successfully", R::SINGULAR), item))
}

pub async fn update<R: Repository>(
    State(repo): State<Arc<R>>,
    ResourceId(id): ResourceId,
    ValidatedJson(input): ValidatedJson<R::Update>,
) -> Result<ApiResponse<R::Entity>, AppError> {
    let item = repo.update(id, input).await?.ok_or_else(R::not_found)?;
    Ok(ApiResponse::ok(format!("{} updated successfully", R::SINGULAR), item))
}

pub async fn remove<R: Repository>(
    State(repo): State<Arc<R>>,
    ResourceId(id): ResourceId,
) -> Result<ApiResponse<()>, AppError> {
    if !repo.delete(id).await? {
        return Err(R::not_found().into());
    }
    Ok(ApiResponse::no_content(format!("{} deleted successfully", R::SINGULAR)))
}
