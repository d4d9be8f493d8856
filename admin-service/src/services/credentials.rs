//! Persistence of user accounts and their reset tickets.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::db::StoreError;
use crate::models::{NewUser, User, UserChanges};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Apply the provided columns; `None` when the id does not exist.
    async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError>;

    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    async fn has_super_admin(&self) -> Result<bool, StoreError>;

    /// Replace any pending reset ticket of the user.
    async fn store_reset_ticket(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// User owning an unexpired ticket matching both `email` and `token_hash`.
    async fn find_by_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Set the new password and clear the ticket in one step, provided the
    /// ticket still matches and has not expired. At most one caller wins.
    async fn consume_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;
}

/// PostgreSQL-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_name = $1")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    #[instrument(skip(self, user), fields(user_name = %user.user_name))]
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, phone, user_name, password, super_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.user_name)
        .bind(&user.password)
        .bind(user.super_admin)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = created.id, "User created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name  = COALESCE($2, first_name),
                last_name   = COALESCE($3, last_name),
                email       = COALESCE($4, email),
                phone       = CASE WHEN $5 THEN $6 ELSE phone END,
                user_name   = COALESCE($7, user_name),
                password    = COALESCE($8, password),
                super_admin = COALESCE($9, super_admin),
                updated_at  = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(changes.phone.is_some())
        .bind(changes.phone.clone().flatten())
        .bind(&changes.user_name)
        .bind(&changes.password)
        .bind(changes.super_admin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_super_admin(&self) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE super_admin)")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn store_reset_ticket(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE email = $1 AND reset_token = $2 AND reset_token_expires > NOW()
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn consume_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password = $3, reset_token = NULL, reset_token_expires = NULL, updated_at = NOW()
            WHERE email = $1 AND reset_token = $2 AND reset_token_expires > NOW()
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

/// In-memory credential store for tests. Enforces the same uniqueness rules
/// as the `users` table.
#[derive(Default)]
pub struct MockCredentialStore {
    users: Mutex<Vec<User>>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<User>>, StoreError> {
        self.users
            .lock()
            .map_err(|e| StoreError::Other(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))
    }

    /// Overwrite the ticket expiry of a user, e.g. to simulate an old ticket.
    pub fn set_reset_expiry(&self, id: i32, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.reset_token_expires = Some(expires_at);
        }
        Ok(())
    }

    fn check_unique(
        users: &[User],
        id: Option<i32>,
        email: &str,
        user_name: &str,
    ) -> Result<(), StoreError> {
        let others = users.iter().filter(|u| Some(u.id) != id);
        for other in others {
            if other.email == email {
                return Err(StoreError::UniqueViolation {
                    constraint: "users_email_unique".to_string(),
                });
            }
            if other.user_name == user_name {
                return Err(StoreError::UniqueViolation {
                    constraint: "users_user_name_unique".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn ticket_matches(user: &User, email: &str, token_hash: &str, now: DateTime<Utc>) -> bool {
    user.email == email
        && user.reset_token.as_deref() == Some(token_hash)
        && user.reset_token_expires.map_or(false, |exp| exp > now)
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.iter().find(|u| u.user_name == user_name).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users = self.lock()?.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.lock()?;
        Self::check_unique(&users, None, &user.email, &user.user_name)?;

        let now = Utc::now();
        let created = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            user_name: user.user_name,
            password: user.password,
            super_admin: user.super_admin,
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut users = self.lock()?;
        let Some(current) = users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };

        let mut next = current;
        if let Some(v) = changes.first_name {
            next.first_name = v;
        }
        if let Some(v) = changes.last_name {
            next.last_name = v;
        }
        if let Some(v) = changes.email {
            next.email = v;
        }
        if let Some(v) = changes.phone {
            next.phone = v;
        }
        if let Some(v) = changes.user_name {
            next.user_name = v;
        }
        if let Some(v) = changes.password {
            next.password = v;
        }
        if let Some(v) = changes.super_admin {
            next.super_admin = v;
        }
        next.updated_at = Utc::now();

        Self::check_unique(&users, Some(id), &next.email, &next.user_name)?;

        if let Some(slot) = users.iter_mut().find(|u| u.id == id) {
            *slot = next.clone();
        }
        Ok(Some(next))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut users = self.lock()?;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn has_super_admin(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.iter().any(|u| u.super_admin))
    }

    async fn store_reset_ticket(
        &self,
        id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.reset_token = Some(token_hash.to_string());
            user.reset_token_expires = Some(expires_at);
        }
        Ok(())
    }

    async fn find_by_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let now = Utc::now();
        Ok(self
            .lock()?
            .iter()
            .find(|u| ticket_matches(u, email, token_hash, now))
            .cloned())
    }

    async fn consume_reset_ticket(
        &self,
        email: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let now = Utc::now();
        let mut users = self.lock()?;
        let Some(user) = users
            .iter_mut()
            .find(|u| ticket_matches(u, email, token_hash, now))
        else {
            return Ok(None);
        };

        user.password = password_hash.to_string();
        user.reset_token = None;
        user.reset_token_expires = None;
        user.updated_at = now;
        Ok(Some(user.clone()))
    }
}
