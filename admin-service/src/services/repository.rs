//! Uniform CRUD contract shared by the resource collections.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::services::ServiceError;

#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// What reads return.
    type Entity: Serialize + Send + Sync + 'static;
    type Create: DeserializeOwned + Validate + Send + 'static;
    type Update: DeserializeOwned + Validate + Send + 'static;

    /// Used in messages, e.g. `Member` / `Members`.
    const SINGULAR: &'static str;
    const PLURAL: &'static str;

    /// All rows in the collection's display order.
    async fn list(&self) -> Result<Vec<Self::Entity>, ServiceError>;

    async fn get(&self, id: i32) -> Result<Option<Self::Entity>, ServiceError>;

    async fn create(&self, input: Self::Create) -> Result<Self::Entity, ServiceError>;

    /// Apply a partial update; `None` when the id does not exist.
    async fn update(&self, id: i32, input: Self::Update)
        -> Result<Option<Self::Entity>, ServiceError>;

    /// `false` when the id does not exist.
    async fn delete(&self, id: i32) -> Result<bool, ServiceError>;

    fn not_found() -> ServiceError {
        ServiceError::NotFound(format!("{} not found", Self::SINGULAR))
    }
}

/// `DELETE FROM {table} WHERE id = $1`, reporting whether a row went away.
pub(crate) async fn delete_by_id(
    pool: &sqlx::PgPool,
    table: &'static str,
    id: i32,
) -> Result<bool, ServiceError> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
