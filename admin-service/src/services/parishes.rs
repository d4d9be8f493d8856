use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::{CreateParishRequest, UpdateParishRequest};
use crate::models::Parish;
use crate::services::repository::{delete_by_id, Repository};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct ParishRepository {
    pool: PgPool,
}

impl ParishRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for ParishRepository {
    type Entity = Parish;
    type Create = CreateParishRequest;
    type Update = UpdateParishRequest;

    const SINGULAR: &'static str = "Parish";
    const PLURAL: &'static str = "Parishes";

    async fn list(&self) -> Result<Vec<Parish>, ServiceError> {
        let parishes =
            sqlx::query_as::<_, Parish>("SELECT * FROM parishes ORDER BY name ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(parishes)
    }

    async fn get(&self, id: i32) -> Result<Option<Parish>, ServiceError> {
        let parish = sqlx::query_as::<_, Parish>("SELECT * FROM parishes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(parish)
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: CreateParishRequest) -> Result<Parish, ServiceError> {
        let parish = sqlx::query_as::<_, Parish>(
            r#"
            INSERT INTO parishes
                (name, address, phone, email, website, mass_schedule, confession_schedule)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.website)
        .bind(&input.mass_schedule)
        .bind(&input.confession_schedule)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(parish_id = parish.id, "Parish created");
        Ok(parish)
    }

    /// Nullable columns take a set flag so that `null` can clear them.
    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: i32,
        input: UpdateParishRequest,
    ) -> Result<Option<Parish>, ServiceError> {
        let parish = sqlx::query_as::<_, Parish>(
            r#"
            UPDATE parishes SET
                name                = COALESCE($2, name),
                address             = CASE WHEN $3 THEN $4 ELSE address END,
                phone               = CASE WHEN $5 THEN $6 ELSE phone END,
                email               = CASE WHEN $7 THEN $8 ELSE email END,
                website             = CASE WHEN $9 THEN $10 ELSE website END,
                mass_schedule       = CASE WHEN $11 THEN $12 ELSE mass_schedule END,
                confession_schedule = CASE WHEN $13 THEN $14 ELSE confession_schedule END,
                updated_at          = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.address.is_some())
        .bind(input.address.clone().flatten())
        .bind(input.phone.is_some())
        .bind(input.phone.clone().flatten())
        .bind(input.email.is_some())
        .bind(input.email.clone().flatten())
        .bind(input.website.is_some())
        .bind(input.website.clone().flatten())
        .bind(input.mass_schedule.is_some())
        .bind(input.mass_schedule.clone().flatten())
        .bind(input.confession_schedule.is_some())
        .bind(input.confession_schedule.clone().flatten())
        .fetch_optional(&self.pool)
        .await?;

        Ok(parish)
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        delete_by_id(&self.pool, "parishes", id).await
    }
}
