use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use crate::error::AppError;
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Per-client limiter keyed by IP address.
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Limiter state handed to [`ip_rate_limit_middleware`]. `None` disables limiting.
#[derive(Clone)]
pub struct RateLimitLayerState {
    limiter: Option<IpRateLimiter>,
    message: &'static str,
}

impl RateLimitLayerState {
    pub fn new(limiter: Option<IpRateLimiter>, message: &'static str) -> Self {
        Self { limiter, message }
    }

    pub fn disabled() -> Self {
        Self {
            limiter: None,
            message: "",
        }
    }
}

/// Quota allowing `max_requests` per `window`, all of them available as a burst.
pub fn window_quota(max_requests: u32, window: Duration) -> Quota {
    let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
    let per_request = window / burst.get();

    Quota::with_period(per_request)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

/// Create a limiter keyed by client IP.
pub fn create_ip_rate_limiter(max_requests: u32, window: Duration) -> IpRateLimiter {
    Arc::new(RateLimiter::dashmap(window_quota(max_requests, window)))
}

/// First hop of `x-forwarded-for`, else the peer address of the connection.
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded_ip.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware for IP-based rate limiting.
pub async fn ip_rate_limit_middleware(
    State(state): State<RateLimitLayerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(limiter) = state.limiter.as_ref() else {
        return Ok(next.run(request).await);
    };

    match client_ip(&request) {
        Some(ip) => match limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
                Err(AppError::TooManyRequests(
                    state.message.to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
