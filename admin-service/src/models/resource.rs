use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of shared resource, stored as the `resource_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Movie,
    Book,
    Podcast,
    Website,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i32,
    pub name: String,
    pub picture: Option<String>,
    pub link: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub resource_type: ResourceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
