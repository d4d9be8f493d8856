use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::User;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// User id
    pub id: i32,
    pub user_name: String,
    pub super_admin: bool,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_hours: config.expiry_hours,
        }
    }

    /// Sign a token for `user`.
    pub fn issue(&self, user: &User) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.expiry_hours);

        let claims = SessionClaims {
            id: user.id,
            user_name: user.user_name.clone(),
            super_admin: user.super_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))
    }

    /// Decode and check a token. Only HS256 is accepted.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: Secret::new(secret.to_string()),
            expiry_hours: 12,
        })
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 42,
            first_name: "Ada".to_string(),
            last_name: "Admin".to_string(),
            email: "ada@example.org".to_string(),
            phone: None,
            user_name: "ada".to_string(),
            password: String::new(),
            super_admin: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify() -> Result<(), anyhow::Error> {
        let tokens = service("test-secret");
        let token = tokens.issue(&user())?;

        let claims = tokens.verify(&token)?;
        assert_eq!(claims.id, 42);
        assert_eq!(claims.user_name, "ada");
        assert!(claims.super_admin);
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
        Ok(())
    }

    #[test]
    fn test_claims_are_camel_case() -> Result<(), anyhow::Error> {
        let claims = SessionClaims {
            id: 1,
            user_name: "ada".to_string(),
            super_admin: false,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims)?;
        assert!(json.get("userName").is_some());
        assert!(json.get("superAdmin").is_some());
        Ok(())
    }

    #[test]
    fn test_wrong_secret_rejected() -> Result<(), anyhow::Error> {
        let token = service("secret-a").issue(&user())?;
        assert!(service("secret-b").verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn test_other_algorithm_rejected() -> Result<(), anyhow::Error> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            id: 42,
            user_name: "ada".to_string(),
            super_admin: true,
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )?;

        assert!(service("test-secret").verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn test_expired_token_rejected() -> Result<(), anyhow::Error> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            id: 42,
            user_name: "ada".to_string(),
            super_admin: false,
            iat: now - 7200,
            exp: now - 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )?;

        assert!(service("test-secret").verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service("test-secret").verify("not.a.token").is_err());
    }
}
