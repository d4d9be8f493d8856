use std::sync::Arc;

use tracing::instrument;

use crate::dtos::{CreateUserRequest, UpdateUserRequest};
use crate::models::SanitizedUser;
use crate::services::{CredentialStore, ServiceError};
use crate::utils::password::hash_password_blocking;
use crate::utils::Password;

const DUPLICATE_USER: &str = "Email or username already exists";

fn user_not_found() -> ServiceError {
    ServiceError::NotFound("User not found".to_string())
}

/// Administrative management of user accounts.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SanitizedUser>, ServiceError> {
        let users = self.store.list().await?;
        Ok(users.into_iter().map(SanitizedUser::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<SanitizedUser, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .map(SanitizedUser::from)
            .ok_or_else(user_not_found)
    }

    #[instrument(skip(self, req), fields(user_name = %req.user_name))]
    pub async fn create(&self, req: CreateUserRequest) -> Result<SanitizedUser, ServiceError> {
        let password_hash = hash_password_blocking(Password::new(req.password.clone())).await?;

        let user = self
            .store
            .create(req.into_new_user(password_hash.into_string()))
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, DUPLICATE_USER))?;

        tracing::info!(user_id = user.id, super_admin = user.super_admin, "User created");
        Ok(user.sanitized())
    }

    #[instrument(skip(self, req))]
    pub async fn update(
        &self,
        id: i32,
        req: UpdateUserRequest,
    ) -> Result<SanitizedUser, ServiceError> {
        let password_hash = match req.password.clone() {
            Some(pw) => Some(hash_password_blocking(Password::new(pw)).await?.into_string()),
            None => None,
        };

        let user = self
            .store
            .update(id, req.into_changes(password_hash))
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, DUPLICATE_USER))?
            .ok_or_else(user_not_found)?;

        tracing::info!(user_id = id, "User updated");
        Ok(user.sanitized())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if !self.store.delete(id).await? {
            return Err(user_not_found());
        }
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}
