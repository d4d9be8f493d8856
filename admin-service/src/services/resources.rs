use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::{CreateResourceRequest, UpdateResourceRequest};
use crate::models::Resource;
use crate::services::repository::{delete_by_id, Repository};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for ResourceRepository {
    type Entity = Resource;
    type Create = CreateResourceRequest;
    type Update = UpdateResourceRequest;

    const SINGULAR: &'static str = "Resource";
    const PLURAL: &'static str = "Resources";

    async fn list(&self) -> Result<Vec<Resource>, ServiceError> {
        let resources =
            sqlx::query_as::<_, Resource>("SELECT * FROM resources ORDER BY name ASC, id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(resources)
    }

    async fn get(&self, id: i32) -> Result<Option<Resource>, ServiceError> {
        let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(resource)
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: CreateResourceRequest) -> Result<Resource, ServiceError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (name, picture, link, type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.picture)
        .bind(&input.link)
        .bind(input.resource_type)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(resource_id = resource.id, "Resource created");
        Ok(resource)
    }

    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: i32,
        input: UpdateResourceRequest,
    ) -> Result<Option<Resource>, ServiceError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources SET
                name       = COALESCE($2, name),
                picture    = CASE WHEN $3 THEN $4 ELSE picture END,
                link       = COALESCE($5, link),
                type       = COALESCE($6, type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.picture.is_some())
        .bind(input.picture.clone().flatten())
        .bind(&input.link)
        .bind(input.resource_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource)
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        delete_by_id(&self.pool, "resources", id).await
    }
}
