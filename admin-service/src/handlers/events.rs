use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, post},
    Router,
};
use service_core::{error::AppError, response::ApiResponse};

use super::resources::crud_routes;
use crate::dtos::AddEventMemberRequest;
use crate::models::EventWithMembers;
use crate::services::EventRepository;
use crate::utils::{EventMemberIds, ResourceId, ValidatedJson};

/// CRUD plus the member registration sub-resource.
pub fn event_routes() -> Router<Arc<EventRepository>> {
    crud_routes::<EventRepository>()
        .route("/:id/members", post(add_member))
        .route("/:id/members/:member_id", delete(remove_member))
}

pub async fn add_member(
    State(events): State<Arc<EventRepository>>,
    ResourceId(event_id): ResourceId,
    ValidatedJson(req): ValidatedJson<AddEventMemberRequest>,
) -> Result<ApiResponse<EventWithMembers>, AppError> {
    let event = events.add_member(event_id, req.member_id).await?;
    Ok(ApiResponse::created("Member added to event successfully", event))
}

pub async fn remove_member(
    State(events): State<Arc<EventRepository>>,
    ids: EventMemberIds,
) -> Result<ApiResponse<EventWithMembers>, AppError> {
    let event = events.remove_member(ids.event_id, ids.member_id).await?;
    Ok(ApiResponse::ok("Member removed from event successfully", event))
}
