//! # Subglacial HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! Ledger gateway (the raw key/value contract):
//! - `GET /health` - Health check
//! - `GET /available` - Store availability probe
//! - `GET /data/{key}` - Read a blob (base64, empty when absent)
//! - `PUT /data/{key}` - Write a blob
//!
//! Records:
//! - `GET /records?search=&status=` - Filtered snapshot, newest first
//! - `GET /records/stats` - Status counts and depth profile
//! - `POST /records` - Submit a record (`X-Researcher` header)
//! - `POST /records/{id}/analyze` - Analyze an owned pending record
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SUBGLACIAL_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `SUBGLACIAL_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `SUBGLACIAL_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, get_api_key_from_env, keys_match};
pub use handlers::{RESEARCHER_HEADER, status_for};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    AvailableResponse, DataResponse, HealthResponse, PutDataRequest, PutDataResponse,
    RecordResponse, RecordsQuery, RecordsResponse, StatsResponse, SubmitRequest,
};

use crate::ledger::Backend;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use subglacial_core::{Classifier, SubglacialError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are refused (2 MiB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the ledger backend and the analysis collaborator.
///
/// No lock: every request reloads what it needs from the store, and the
/// store itself serializes single-key writes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Backend>,
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    /// Create app state over a backend.
    #[must_use]
    pub fn new(store: Backend, classifier: impl Classifier + 'static) -> Self {
        Self {
            store: Arc::new(store),
            classifier: Arc::new(classifier),
        }
    }
}

// =============================================================================
// SERVER OPTIONS
// =============================================================================

/// Middleware switches, normally taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub api_key: Option<ApiKey>,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: u32,
}

impl ServerOptions {
    /// Read `SUBGLACIAL_API_KEY` and `SUBGLACIAL_RATE_LIMIT`.
    pub fn from_env() -> Self {
        Self {
            api_key: get_api_key_from_env(),
            rate_limit: get_rate_limit_from_env(),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

fn cors_methods() -> [Method; 4] {
    [Method::GET, Method::POST, Method::PUT, Method::OPTIONS]
}

fn cors_headers() -> [HeaderName; 3] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(RESEARCHER_HEADER),
    ]
}

/// Build the CORS layer from `SUBGLACIAL_CORS_ORIGINS`.
///
/// - `*`: any origin
/// - unset, or no parsable entries: localhost only
/// - otherwise: the comma-separated origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("SUBGLACIAL_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (SUBGLACIAL_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in SUBGLACIAL_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(cors_methods())
                    .allow_headers(cors_headers())
            }
        }
        None => {
            tracing::info!("CORS: No SUBGLACIAL_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// CORS layer allowing only the usual local dev-server origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .map(HeaderValue::from_static)
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(cors_methods())
        .allow_headers(cors_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with middleware configured from the environment.
pub fn create_router(state: AppState) -> Router {
    create_router_with(state, ServerOptions::from_env())
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router_with(state: AppState, options: ServerOptions) -> Router {
    let cors = build_cors_layer();

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/available", get(handlers::available_handler))
        .route(
            "/data/{key}",
            get(handlers::get_data_handler).put(handlers::put_data_handler),
        )
        .route(
            "/records",
            get(handlers::list_records_handler).post(handlers::submit_handler),
        )
        .route("/records/stats", get(handlers::stats_handler))
        .route("/records/{id}/analyze", post(handlers::analyze_handler));

    if let Some(key) = options.api_key {
        tracing::info!("API key authentication enabled");
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::api_key_auth_middleware,
        ));
    } else {
        tracing::warn!(
            "API key authentication DISABLED - the ledger gateway is publicly writable! \
             Set SUBGLACIAL_API_KEY to enable authentication."
        );
    }

    if let Some(limiter) = create_rate_limiter(options.rate_limit) {
        tracing::info!("Rate limiting enabled: {} requests/second", options.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), SubglacialError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SubglacialError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Subglacial HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SubglacialError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// =============================================================================
// TESTS
// =============================================================================
