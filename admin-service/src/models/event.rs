use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub picture_link: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member as listed on an event.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventMemberSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
}

/// An event together with its registered members; every event read returns this.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithMembers {
    #[serde(flatten)]
    pub event: Event,
    pub members: Vec<EventMemberSummary>,
}

/// Row of the join query used to enrich a batch of events.
#[derive(Debug, Clone, FromRow)]
pub struct EventMemberRow {
    pub event_id: i32,
    #[sqlx(flatten)]
    pub member: EventMemberSummary,
}
