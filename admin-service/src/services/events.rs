use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::StoreError;
use crate::dtos::{CreateEventRequest, UpdateEventRequest};
use crate::models::{Event, EventMemberRow, EventMemberSummary, EventWithMembers};
use crate::services::repository::{delete_by_id, Repository};
use crate::services::ServiceError;

pub const MEMBER_ALREADY_REGISTERED: &str = "Member is already registered for this event";

/// Events and their member registrations. Every event it returns carries
/// its current member list.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_event(&self, id: i32) -> Result<Option<Event>, ServiceError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn require_event(&self, id: i32) -> Result<Event, ServiceError> {
        self.find_event(id).await?.ok_or_else(Self::not_found)
    }

    /// Attach member lists to a batch of events with a single query.
    async fn enrich(&self, events: Vec<Event>) -> Result<Vec<EventWithMembers>, ServiceError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = events.iter().map(|e| e.id).collect();
        let rows = sqlx::query_as::<_, EventMemberRow>(
            r#"
            SELECT em.event_id, m.id, m.first_name, m.last_name, m.email, m.active
            FROM event_members em
            JOIN members m ON m.id = em.member_id
            WHERE em.event_id = ANY($1)
            ORDER BY m.last_name ASC, m.first_name ASC, m.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<i32, Vec<EventMemberSummary>> = HashMap::new();
        for row in rows {
            by_event.entry(row.event_id).or_default().push(row.member);
        }

        Ok(events
            .into_iter()
            .map(|event| EventWithMembers {
                members: by_event.remove(&event.id).unwrap_or_default(),
                event,
            })
            .collect())
    }

    async fn enrich_one(&self, event: Event) -> Result<EventWithMembers, ServiceError> {
        let mut enriched = self.enrich(vec![event]).await?;
        enriched.pop().ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!("event enrichment returned no rows"))
        })
    }

    /// Register a member for an event.
    #[instrument(skip(self))]
    pub async fn add_member(
        &self,
        event_id: i32,
        member_id: i32,
    ) -> Result<EventWithMembers, ServiceError> {
        let event = self.require_event(event_id).await?;

        let member_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM members WHERE id = $1)")
                .bind(member_id)
                .fetch_one(&self.pool)
                .await?;
        if !member_exists {
            return Err(ServiceError::NotFound("Member not found".to_string()));
        }

        let inserted =
            sqlx::query("INSERT INTO event_members (event_id, member_id) VALUES ($1, $2)")
                .bind(event_id)
                .bind(member_id)
                .execute(&self.pool)
                .await;

        match inserted.map_err(StoreError::from) {
            Ok(_) => {}
            Err(StoreError::UniqueViolation { .. }) => {
                return Err(ServiceError::Conflict(MEMBER_ALREADY_REGISTERED.to_string()));
            }
            // Either side was deleted after the existence checks.
            Err(StoreError::ForeignKeyViolation { constraint }) => {
                let missing = if constraint.contains("member_id") {
                    "Member not found"
                } else {
                    "Event not found"
                };
                return Err(ServiceError::NotFound(missing.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(event_id, member_id, "Member added to event");
        self.enrich_one(event).await
    }

    /// Remove a member's registration from an event.
    #[instrument(skip(self))]
    pub async fn remove_member(
        &self,
        event_id: i32,
        member_id: i32,
    ) -> Result<EventWithMembers, ServiceError> {
        let event = self.require_event(event_id).await?;

        let result = sqlx::query("DELETE FROM event_members WHERE event_id = $1 AND member_id = $2")
            .bind(event_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Event member not found".to_string()));
        }

        tracing::info!(event_id, member_id, "Member removed from event");
        self.enrich_one(event).await
    }
}

#[async_trait]
impl Repository for EventRepository {
    type Entity = EventWithMembers;
    type Create = CreateEventRequest;
    type Update = UpdateEventRequest;

    const SINGULAR: &'static str = "Event";
    const PLURAL: &'static str = "Events";

    async fn list(&self) -> Result<Vec<EventWithMembers>, ServiceError> {
        let events =
            sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY start_date_time ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;
        self.enrich(events).await
    }

    async fn get(&self, id: i32) -> Result<Option<EventWithMembers>, ServiceError> {
        match self.find_event(id).await? {
            Some(event) => Ok(Some(self.enrich_one(event).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create(&self, input: CreateEventRequest) -> Result<EventWithMembers, ServiceError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events
                (name, start_date_time, end_date_time, picture_link, description, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.start_date_time)
        .bind(input.end_date_time)
        .bind(&input.picture_link)
        .bind(&input.description)
        .bind(&input.location)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(event_id = event.id, "Event created");
        Ok(EventWithMembers {
            event,
            members: Vec::new(),
        })
    }

    /// End-before-start against the stored value is caught by the
    /// `events_end_after_start` check constraint.
    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: i32,
        input: UpdateEventRequest,
    ) -> Result<Option<EventWithMembers>, ServiceError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events SET
                name            = COALESCE($2, name),
                start_date_time = COALESCE($3, start_date_time),
                end_date_time   = COALESCE($4, end_date_time),
                picture_link    = CASE WHEN $5 THEN $6 ELSE picture_link END,
                description     = CASE WHEN $7 THEN $8 ELSE description END,
                location        = CASE WHEN $9 THEN $10 ELSE location END,
                updated_at      = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.start_date_time)
        .bind(input.end_date_time)
        .bind(input.picture_link.is_some())
        .bind(input.picture_link.clone().flatten())
        .bind(input.description.is_some())
        .bind(input.description.clone().flatten())
        .bind(input.location.is_some())
        .bind(input.location.clone().flatten())
        .fetch_optional(&self.pool)
        .await?;

        match event {
            Some(event) => Ok(Some(self.enrich_one(event).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        delete_by_id(&self.pool, "events", id).await
    }
}
