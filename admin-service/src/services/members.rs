use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::{CreateMemberRequest, UpdateMemberRequest};
use crate::models::Member;
use crate::services::repository::{delete_by_id, Repository};
use crate::services::ServiceError;

const DUPLICATE_MEMBER: &str = "Member with this email already exists";

#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for MemberRepository {
    type Entity = Member;
    type Create = CreateMemberRequest;
    type Update = UpdateMemberRequest;

    const SINGULAR: &'static str = "Member";
    const PLURAL: &'static str = "Members";

    async fn list(&self) -> Result<Vec<Member>, ServiceError> {
        let members =
            sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(members)
    }

    async fn get(&self, id: i32) -> Result<Option<Member>, ServiceError> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: CreateMemberRequest) -> Result<Member, ServiceError> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (first_name, last_name, email, join_date, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(input.join_date)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e.into(), DUPLICATE_MEMBER))?;

        tracing::info!(member_id = member.id, "Member created");
        Ok(member)
    }

    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: i32,
        input: UpdateMemberRequest,
    ) -> Result<Option<Member>, ServiceError> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                join_date  = COALESCE($5, join_date),
                active     = COALESCE($6, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(input.join_date)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e.into(), DUPLICATE_MEMBER))?;

        Ok(member)
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        delete_by_id(&self.pool, "members", id).await
    }
}
