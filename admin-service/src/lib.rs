pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::HeaderName, HeaderValue, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, RateLimitLayerState},
    rejection::envelope_rejection_middleware,
    request_id::{request_id_middleware, REQUEST_ID_HEADER},
    timing::{request_timing_middleware, SlowRequestThreshold},
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AdminConfig, RateLimitConfig};
use crate::handlers::{events::event_routes, resources::crud_routes};
use crate::middleware::{auth_middleware, require_super_admin};
use crate::services::{
    AuthService, CredentialStore, DashboardService, EmailProvider, EventRepository,
    MemberRepository, ParishRepository, PrayerRequestRepository, ResourceRepository, TokenService,
    UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AdminConfig,
    pub db: PgPool,
    pub store: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub members: Arc<MemberRepository>,
    pub events: Arc<EventRepository>,
    pub parishes: Arc<ParishRepository>,
    pub resources: Arc<ResourceRepository>,
    pub prayer_requests: Arc<PrayerRequestRepository>,
    pub dashboard: DashboardService,
    pub ip_rate_limit: RateLimitLayerState,
    pub auth_rate_limit: RateLimitLayerState,
}

impl AppState {
    /// Wire every service onto one pool, credential store and mailer.
    pub fn new(
        config: AdminConfig,
        db: PgPool,
        store: Arc<dyn CredentialStore>,
        email: Arc<dyn EmailProvider>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        let auth_service = AuthService::new(
            store.clone(),
            email,
            tokens.clone(),
            config.email.app_base_url.clone(),
        );
        let (ip_rate_limit, auth_rate_limit) = rate_limit_states(&config.rate_limit);

        Self {
            user_service: UserService::new(store.clone()),
            members: Arc::new(MemberRepository::new(db.clone())),
            events: Arc::new(EventRepository::new(db.clone())),
            parishes: Arc::new(ParishRepository::new(db.clone())),
            resources: Arc::new(ResourceRepository::new(db.clone())),
            prayer_requests: Arc::new(PrayerRequestRepository::new(db.clone())),
            dashboard: DashboardService::new(db.clone()),
            config,
            db,
            store,
            tokens,
            auth_service,
            ip_rate_limit,
            auth_rate_limit,
        }
    }
}

fn rate_limit_states(config: &RateLimitConfig) -> (RateLimitLayerState, RateLimitLayerState) {
    if !config.enabled {
        tracing::info!("Rate limiting disabled");
        return (RateLimitLayerState::disabled(), RateLimitLayerState::disabled());
    }

    let window = Duration::from_millis(config.window_ms);
    (
        RateLimitLayerState::new(
            Some(create_ip_rate_limiter(config.max_requests, window)),
            "Too many requests, please try again later",
        ),
        RateLimitLayerState::new(
            Some(create_ip_rate_limiter(config.auth_max_requests, window)),
            "Too many authentication attempts, please try again later",
        ),
    )
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]))
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Credential endpoints share the stricter limiter
    let auth_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password))
        .route_layer(from_fn_with_state(
            state.auth_rate_limit.clone(),
            ip_rate_limit_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route_layer(from_fn(require_super_admin));

    let protected_routes = Router::new()
        .route(
            "/api/users/me",
            get(handlers::user::get_me).put(handlers::user::update_me),
        )
        .route(
            "/api/users/me/change-password",
            post(handlers::user::change_password),
        )
        .route("/api/dashboard/stats", get(handlers::dashboard::stats))
        .merge(admin_routes)
        .nest(
            "/api/members",
            crud_routes::<MemberRepository>().with_state(state.members.clone()),
        )
        .nest("/api/events", event_routes().with_state(state.events.clone()))
        .nest(
            "/api/parishes",
            crud_routes::<ParishRepository>().with_state(state.parishes.clone()),
        )
        .nest(
            "/api/resources",
            crud_routes::<ResourceRepository>().with_state(state.resources.clone()),
        )
        .nest(
            "/api/prayer-requests",
            crud_routes::<PrayerRequestRepository>().with_state(state.prayer_requests.clone()),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let slow_threshold = SlowRequestThreshold(Duration::from_millis(
        state.config.security.slow_request_threshold_ms,
    ));

    let app = Router::new()
        .route("/api/health", get(handlers::system::health))
        .route("/api/metrics", get(handlers::system::metrics))
        .route(
            "/api/auth/reset-password/validate",
            get(handlers::auth::validate_reset_token),
        )
        .merge(auth_routes)
        .merge(protected_routes)
        // Per route so the matched path is available as a metric label
        .route_layer(from_fn_with_state(slow_threshold, request_timing_middleware))
        .fallback(handlers::system::route_not_found)
        .with_state(state.clone())
        .layer(from_fn(envelope_rejection_middleware))
        .layer(from_fn_with_state(
            state.ip_rate_limit.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins)?);

    Ok(app)
}
