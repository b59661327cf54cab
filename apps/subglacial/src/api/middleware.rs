//! # Middleware Module
//!
//! Rate limiting for the Subglacial HTTP API.
//!
//! ## Configuration
//!
//! - `SUBGLACIAL_RATE_LIMIT`: requests per second across all clients
//!   (default 100, `0` disables)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Requests per second when nothing is configured.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Shared, unkeyed rate limiter.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a limiter allowing `requests_per_second`, or `None` for zero.
pub fn create_rate_limiter(requests_per_second: u32) -> Option<GlobalRateLimiter> {
    let rps = NonZeroU32::new(requests_per_second)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Parse a `SUBGLACIAL_RATE_LIMIT` value; junk falls back to the default.
pub fn parse_rate_limit(value: Option<&str>) -> u32 {
    match value.map(str::trim) {
        None | Some("") => DEFAULT_RATE_LIMIT,
        Some(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(value = v, "SUBGLACIAL_RATE_LIMIT is not a number, using default");
            DEFAULT_RATE_LIMIT
        }),
    }
}

/// Read `SUBGLACIAL_RATE_LIMIT` from the environment.
pub fn get_rate_limit_from_env() -> u32 {
    parse_rate_limit(std::env::var("SUBGLACIAL_RATE_LIMIT").ok().as_deref())
}

/// Answer 429 once the shared quota is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if limiter.check().is_ok() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Rate limit exceeded");
        Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
    }
}

// =============================================================================
// TESTS
// =============================================================================
