use std::fmt;

/// bcrypt work factor; matches hashes written by earlier deployments.
pub const HASH_COST: u32 = 10;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Newtype for password hash
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password with bcrypt; the salt is embedded in the output.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let hash = bcrypt::hash(password.as_str(), HASH_COST)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(PasswordHashString::new(hash))
}

/// Constant-time check of `password` against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &Password, password_hash: &str) -> bool {
    match bcrypt::verify(password.as_str(), password_hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}

/// Hashing is CPU bound; keep it off the async workers.
pub async fn hash_password_blocking(
    password: Password,
) -> Result<PasswordHashString, anyhow::Error> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: Password, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("mySecurePassword123");
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.as_str().starts_with("$2b$10$"));
    }

    #[test]
    fn test_verify_password() {
        let password = Password::new("mySecurePassword123");
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, hash.as_str()));
        assert!(!verify_password(&Password::new("wrongPassword"), hash.as_str()));
    }

    #[test]
    fn test_verify_accepts_2a_prefix() {
        // Hashes produced by bcryptjs carry the $2a$ prefix.
        let hash = hash_password(&Password::new("legacy-password"))
            .unwrap()
            .into_string()
            .replacen("$2b$", "$2a$", 1);

        assert!(verify_password(&Password::new("legacy-password"), &hash));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password(&Password::new("anything"), "not-a-hash"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = Password::new("hunter22");
        assert_eq!(format!("{:?}", password), "Password(***)");
    }
}
