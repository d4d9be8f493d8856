use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use std::time::{Duration, Instant};

pub const DEFAULT_SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(1000);

/// Requests taking at least this long are reported as slow.
#[derive(Debug, Clone, Copy)]
pub struct SlowRequestThreshold(pub Duration);

impl Default for SlowRequestThreshold {
    fn default() -> Self {
        Self(DEFAULT_SLOW_REQUEST_THRESHOLD)
    }
}

impl SlowRequestThreshold {
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed >= self.0
    }
}

/// Records request counters and latency, and warns about slow requests.
/// Observes only; the request is never cut short.
pub async fn request_timing_middleware(
    State(threshold): State<SlowRequestThreshold>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // matched route keeps label cardinality bounded
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16().to_string();

    if threshold.is_slow(elapsed) {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = elapsed.as_millis() as u64,
            "Slow request"
        );
    }

    let labels = [("method", method), ("path", path), ("status", status)];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let threshold = SlowRequestThreshold::default();
        assert!(!threshold.is_slow(Duration::from_millis(999)));
        assert!(threshold.is_slow(Duration::from_millis(1000)));
        assert!(threshold.is_slow(Duration::from_secs(3)));
    }
}
