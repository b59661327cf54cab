//! # Authentication Module
//!
//! Optional API key authentication for the Subglacial HTTP API.
//!
//! ## Configuration
//!
//! - `SUBGLACIAL_API_KEY`: if set, every request except `/health` needs it
//!
//! The key is read once when the router is built. It protects the ledger
//! gateway as a whole; per-record ownership is a separate check done with
//! the `X-Researcher` identity.
//!
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The configured API key, shared by every request.
pub type ApiKey = Arc<str>;

/// Paths reachable without a key (load balancer probes).
const PUBLIC_PATHS: [&str; 1] = ["/health"];

/// Read `SUBGLACIAL_API_KEY`. Empty or unset disables authentication.
pub fn get_api_key_from_env() -> Option<ApiKey> {
    std::env::var("SUBGLACIAL_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .map(Arc::from)
}

/// Compare two keys in time independent of where they first differ.
///
/// Both sides are padded to the longer length so `ct_eq` always scans the
/// same number of bytes; the length check comes after.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let (provided, expected) = (provided.as_bytes(), expected.as_bytes());
    let len = provided.len().max(expected.len());

    let mut a = vec![0u8; len];
    let mut b = vec![0u8; len];
    a[..provided.len()].copy_from_slice(provided);
    b[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = a.ct_eq(&b).into();
    bytes_match && provided.len() == expected.len()
}

/// Reject requests without `Authorization: Bearer <key>` (or a raw key).
pub async fn api_key_auth_middleware(
    State(expected): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let Some(header_value) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
    if keys_match(provided, &expected) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_api_key",
            "Authentication failed: invalid API key"
        );
        Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("s3cret", "s3cret"));
        assert!(!keys_match("s3cre", "s3cret"));
        assert!(!keys_match("s3cret\0", "s3cret"));
        assert!(!keys_match("", "s3cret"));
        assert!(!keys_match("S3CRET", "s3cret"));
    }
}
