use async_trait::async_trait;
use chrono::Local;
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::{CreatePrayerRequestRequest, UpdatePrayerRequestRequest};
use crate::models::PrayerRequest;
use crate::services::repository::{delete_by_id, Repository};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct PrayerRequestRepository {
    pool: PgPool,
}

impl PrayerRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PrayerRequestRepository {
    type Entity = PrayerRequest;
    type Create = CreatePrayerRequestRequest;
    type Update = UpdatePrayerRequestRequest;

    const SINGULAR: &'static str = "Prayer request";
    const PLURAL: &'static str = "Prayer requests";

    async fn list(&self) -> Result<Vec<PrayerRequest>, ServiceError> {
        let requests = sqlx::query_as::<_, PrayerRequest>(
            "SELECT * FROM prayers_requests ORDER BY date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn get(&self, id: i32) -> Result<Option<PrayerRequest>, ServiceError> {
        let request =
            sqlx::query_as::<_, PrayerRequest>("SELECT * FROM prayers_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    #[instrument(skip(self, input))]
    async fn create(
        &self,
        input: CreatePrayerRequestRequest,
    ) -> Result<PrayerRequest, ServiceError> {
        let date = input.date.unwrap_or_else(|| Local::now().date_naive());

        let request = sqlx::query_as::<_, PrayerRequest>(
            r#"
            INSERT INTO prayers_requests (content, date)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&input.content)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(prayer_request_id = request.id, "Prayer request created");
        Ok(request)
    }

    /// An omitted date is reset to today, matching creation.
    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: i32,
        input: UpdatePrayerRequestRequest,
    ) -> Result<Option<PrayerRequest>, ServiceError> {
        let date = input.date.unwrap_or_else(|| Local::now().date_naive());

        let request = sqlx::query_as::<_, PrayerRequest>(
            r#"
            UPDATE prayers_requests SET
                content    = COALESCE($2, content),
                date       = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.content)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        delete_by_id(&self.pool, "prayers_requests", id).await
    }
}
