use crate::config::ThrottleConfig;
use crate::error::SiteError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

pub type GlobalLimiter = DefaultDirectRateLimiter;

/// `None` when throttling is disabled (`requests_per_minute = 0`).
pub fn build_limiter(cfg: &ThrottleConfig) -> Option<Arc<GlobalLimiter>> {
    let per_minute = NonZeroU32::new(cfg.requests_per_minute)?;
    let burst = NonZeroU32::new(cfg.burst).unwrap_or(per_minute);
    Some(Arc::new(RateLimiter::direct(
        Quota::per_minute(per_minute).allow_burst(burst),
    )))
}

/// Reject with 429 once the global quota is exhausted.
pub async fn throttle(
    State(limiter): State<Arc<GlobalLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        debug!(path = %req.uri().path(), "request throttled");
        return SiteError::RateLimited.into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_disables_throttling() {
        assert!(build_limiter(&ThrottleConfig::default()).is_none());
    }

    #[test]
    fn burst_caps_immediate_requests() {
        let limiter = build_limiter(&ThrottleConfig {
            requests_per_minute: 60,
            burst: 2,
        })
        .unwrap();
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
