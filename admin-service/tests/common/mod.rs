//! Shared setup for the admin-service router tests.
//!
//! Credentials and mail run against in-memory doubles. The PostgreSQL pool is
//! lazy, so nothing connects unless a test touches a resource collection.

#![allow(dead_code)]

use admin_service::{
    build_router,
    config::{
        AdminConfig, DatabaseConfig, EmailConfig, Environment, JwtConfig, RateLimitConfig,
        SecurityConfig,
    },
    db,
    models::{NewUser, User},
    services::{CredentialStore, MockCredentialStore, MockEmailService},
    utils::{password::hash_password, Password},
    AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-admin-service";
pub const TEST_PASSWORD: &str = "password123";
pub const APP_BASE_URL: &str = "http://localhost:3000";

pub fn test_database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/cyacc_admin_test".to_string())
}

pub fn test_config() -> AdminConfig {
    AdminConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "admin-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: Secret::new(test_database_url()),
            max_connections: 2,
            min_connections: 0,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
            expiry_hours: 12,
        },
        email: EmailConfig {
            user: "noreply@example.org".to_string(),
            password: Secret::new(String::new()),
            from_name: "CYACC Admin".to_string(),
            smtp_host: "localhost".to_string(),
            app_base_url: APP_BASE_URL.to_string(),
        },
        security: SecurityConfig {
            allowed_origins: Vec::new(),
            slow_request_threshold_ms: 1000,
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            max_requests: 500,
            auth_max_requests: 5,
            window_ms: 900_000,
        },
        bootstrap: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MockCredentialStore>,
    pub email: Arc<MockEmailService>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AdminConfig) -> Self {
        let pool = db::lazy_pool(&config.database).expect("test database url should parse");
        let store = Arc::new(MockCredentialStore::new());
        let email = Arc::new(MockEmailService::new());

        let state = AppState::new(config, pool, store.clone(), email.clone());
        let router = build_router(state.clone())
            .await
            .expect("router should build");

        Self {
            router,
            state,
            store,
            email,
        }
    }

    /// Insert a user whose password is [`TEST_PASSWORD`].
    pub async fn seed_user(&self, user_name: &str, super_admin: bool) -> User {
        let hash = hash_password(&Password::new(TEST_PASSWORD)).expect("hashing should succeed");
        self.store
            .create(NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: format!("{}@example.org", user_name),
                phone: None,
                user_name: user_name.to_string(),
                password: hash.into_string(),
                super_admin,
            })
            .await
            .expect("seeding should succeed")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(user).expect("token should be issued")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(res: Response) -> serde_json::Value {
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be json")
}

pub async fn body_bytes(res: Response) -> axum::body::Bytes {
    res.into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
}

/// Pull the raw token out of a reset link captured by the mock mailer.
pub fn reset_token_from(body: &str) -> String {
    let link = body
        .lines()
        .find(|line| line.starts_with(APP_BASE_URL))
        .expect("mail should contain the reset link");
    link.split("token=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .expect("link should carry a token")
        .to_string()
}
