//! Login, password reset and self-service account operations.

use std::sync::Arc;

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::BootstrapAdminConfig;
use crate::dtos::{
    AuthResponse, ChangePasswordRequest, LoginRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use crate::models::{NewUser, SanitizedUser, User};
use crate::services::{CredentialStore, EmailProvider, ServiceError, TokenService};
use crate::utils::password::{hash_password, hash_password_blocking, verify_password_blocking};
use crate::utils::reset_token::{generate_reset_token, hash_reset_token};
use crate::utils::Password;

/// Lifetime of a password reset ticket.
pub const RESET_TICKET_TTL_MINUTES: i64 = 60;

const PROFILE_PASSWORD_REQUIRED: &str = "Current password is required to update profile.";
const CURRENT_PASSWORD_INCORRECT: &str = "Current password is incorrect.";

/// Verified against when the user name is unknown, so both login failures
/// cost one bcrypt comparison.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    hash_password(&Password::new("not-a-real-password"))
        .map(|h| h.into_string())
        .unwrap_or_default()
});

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    email: Arc<dyn EmailProvider>,
    tokens: TokenService,
    app_base_url: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        email: Arc<dyn EmailProvider>,
        tokens: TokenService,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            email,
            tokens,
            app_base_url: app_base_url.into(),
        }
    }

    // ==================== Login ====================

    #[instrument(skip(self, req), fields(user_name = %req.user_name))]
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let user = self.store.find_by_user_name(&req.user_name).await?;

        let password = Password::new(req.password);
        let Some(user) = user else {
            let _ = verify_password_blocking(password, DUMMY_HASH.clone()).await;
            tracing::warn!("Login failed");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password_blocking(password, user.password.clone()).await {
            tracing::warn!(user_id = user.id, "Login failed");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = user.id, "Login successful");

        Ok(AuthResponse {
            token,
            user: user.sanitized(),
        })
    }

    // ==================== Password Reset ====================

    /// Start a reset. Unknown addresses succeed silently.
    #[instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let raw_token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TICKET_TTL_MINUTES);
        self.store
            .store_reset_ticket(user.id, &hash_reset_token(&raw_token), expires_at)
            .await?;

        let reset_link = self.reset_link(&raw_token, &user.email);
        self.email
            .send_password_reset_email(&user.email, &reset_link)
            .await
            .map_err(ServiceError::Email)?;

        tracing::info!(user_id = user.id, "Password reset ticket issued");
        Ok(())
    }

    fn reset_link(&self, raw_token: &str, email: &str) -> String {
        format!(
            "{}/reset-password?token={}&email={}",
            self.app_base_url,
            raw_token,
            urlencoding::encode(email)
        )
    }

    /// Check a reset token without consuming it.
    pub async fn validate_reset_token(
        &self,
        token: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, ServiceError> {
        let (token, email) = require_ticket_params(token, email)?;

        self.store
            .find_by_reset_ticket(email, &hash_reset_token(token))
            .await?
            .ok_or(ServiceError::ResetTokenRejected)
    }

    /// Consume the ticket, set the new password and sign the user in.
    #[instrument(skip_all)]
    pub async fn complete_password_reset(
        &self,
        req: ResetPasswordRequest,
    ) -> Result<AuthResponse, ServiceError> {
        let (token, email) = require_ticket_params(Some(&req.token), Some(&req.email))?;
        let token_hash = hash_reset_token(token);

        if self
            .store
            .find_by_reset_ticket(email, &token_hash)
            .await?
            .is_none()
        {
            return Err(ServiceError::ResetTokenRejected);
        }

        let password_hash = hash_password_blocking(Password::new(req.password)).await?;

        // The conditional update is what enforces single use.
        let user = self
            .store
            .consume_reset_ticket(email, &token_hash, password_hash.as_str())
            .await?
            .ok_or(ServiceError::ResetTokenRejected)?;

        tracing::info!(user_id = user.id, "Password reset completed");

        if let Err(e) = self.email.send_password_updated_email(&user.email).await {
            tracing::warn!(user_id = user.id, error = %e, "Password updated notice not sent");
        }

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse {
            token,
            user: user.sanitized(),
        })
    }

    // ==================== Self Service ====================

    pub async fn current_user(&self, id: i32) -> Result<SanitizedUser, ServiceError> {
        self.load_user(id).await.map(|u| u.sanitized())
    }

    #[instrument(skip(self, req))]
    pub async fn update_profile(
        &self,
        id: i32,
        req: UpdateProfileRequest,
    ) -> Result<SanitizedUser, ServiceError> {
        let user = self.load_user(id).await?;

        let current = req
            .current_password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::BadRequest(PROFILE_PASSWORD_REQUIRED.to_string()))?;

        if !verify_password_blocking(Password::new(current), user.password.clone()).await {
            return Err(ServiceError::BadRequest(CURRENT_PASSWORD_INCORRECT.to_string()));
        }

        let password_hash = match req.password.clone() {
            Some(pw) => Some(hash_password_blocking(Password::new(pw)).await?.into_string()),
            None => None,
        };

        let updated = self
            .store
            .update(id, req.into_changes(password_hash))
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Email already exists"))?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = id, "Profile updated");
        Ok(updated.sanitized())
    }

    /// Replace the password. The caller's session token stays valid.
    #[instrument(skip(self, req))]
    pub async fn change_password(
        &self,
        id: i32,
        req: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        let user = self.load_user(id).await?;

        if !verify_password_blocking(Password::new(req.current_password), user.password.clone())
            .await
        {
            return Err(ServiceError::BadRequest(CURRENT_PASSWORD_INCORRECT.to_string()));
        }

        let password_hash = hash_password_blocking(Password::new(req.new_password)).await?;
        let changes = crate::models::UserChanges {
            password: Some(password_hash.into_string()),
            ..Default::default()
        };
        self.store
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = id, "Password changed");

        if let Err(e) = self.email.send_password_changed_email(&user.email).await {
            tracing::warn!(user_id = id, error = %e, "Password changed notice not sent");
        }

        Ok(())
    }

    async fn load_user(&self, id: i32) -> Result<User, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    // ==================== Bootstrap ====================

    /// Create the first super administrator unless one already exists.
    /// Returns whether an account was created.
    pub async fn bootstrap_super_admin(
        &self,
        config: &BootstrapAdminConfig,
    ) -> Result<bool, ServiceError> {
        if self.store.has_super_admin().await? {
            tracing::debug!("Super administrator present, bootstrap skipped");
            return Ok(false);
        }

        let password_hash =
            hash_password_blocking(Password::new(config.password.expose_secret().clone())).await?;

        let user = self
            .store
            .create(NewUser {
                first_name: config.first_name.clone(),
                last_name: config.last_name.clone(),
                email: config.email.clone(),
                phone: None,
                user_name: config.user_name.clone(),
                password: password_hash.into_string(),
                super_admin: true,
            })
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Email or username already exists"))?;

        tracing::info!(user_id = user.id, "Bootstrap super administrator created");
        Ok(true)
    }
}

fn require_ticket_params<'a>(
    token: Option<&'a str>,
    email: Option<&'a str>,
) -> Result<(&'a str, &'a str), ServiceError> {
    match (token.map(str::trim), email.map(str::trim)) {
        (Some(t), Some(e)) if !t.is_empty() && !e.is_empty() => Ok((t, e)),
        _ => Err(ServiceError::MissingResetToken),
    }
}
