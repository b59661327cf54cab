//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        AvailableResponse, DataResponse, HealthResponse, PutDataRequest, PutDataResponse,
        RecordResponse, RecordsQuery, RecordsResponse, StatsResponse, SubmitRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subglacial_core::{
    Identity, RecordFilter, RecordId, RecordLifecycle, RecordStore, StatusFilter, StoreError,
    SubglacialError, WriteError, load_all,
    primitives::{DEPTH_PROFILE_LIMIT, MAX_IDENTITY_LENGTH},
};

/// Header carrying the caller's ledger identity.
pub const RESEARCHER_HEADER: &str = "x-researcher";

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for a record-layer error.
pub fn status_for(err: &SubglacialError) -> StatusCode {
    match err {
        SubglacialError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        SubglacialError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        SubglacialError::InvalidTransition(_) => StatusCode::CONFLICT,
        SubglacialError::InvalidField(_) | SubglacialError::Config(_) => StatusCode::BAD_REQUEST,
        SubglacialError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        SubglacialError::Write(_)
        | SubglacialError::Orphaned { .. }
        | SubglacialError::Read(_) => StatusCode::BAD_GATEWAY,
        SubglacialError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubglacialError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn record_error(err: &SubglacialError) -> (StatusCode, Json<RecordResponse>) {
    (status_for(err), Json(RecordResponse::error(err.to_string())))
}

/// Read the caller identity from `X-Researcher`.
fn identity_from(headers: &HeaderMap) -> Result<Identity, SubglacialError> {
    let value = headers
        .get(RESEARCHER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            SubglacialError::InvalidField("missing X-Researcher header".to_string())
        })?;
    if value.len() > MAX_IDENTITY_LENGTH {
        return Err(SubglacialError::InvalidField(format!(
            "identity length {} exceeds maximum {} bytes",
            value.len(),
            MAX_IDENTITY_LENGTH
        )));
    }
    Ok(Identity::new(value))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// LEDGER GATEWAY HANDLERS
// =============================================================================

/// `GET /available`
pub async fn available_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(AvailableResponse {
        available: state.store.available().await,
    })
}

/// `GET /data/{key}`
pub async fn get_data_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&key).await {
        Ok(bytes) => (
            StatusCode::OK,
            Json(DataResponse {
                key,
                value: STANDARD.encode(bytes),
            }),
        )
            .into_response(),
        Err(StoreError::Unavailable) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(AvailableResponse { available: false }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ledger read failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// `PUT /data/{key}`
pub async fn put_data_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<PutDataRequest>,
) -> impl IntoResponse {
    let value = match STANDARD.decode(request.value.as_bytes()) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PutDataResponse::error(format!("Invalid base64 value: {}", e))),
            );
        }
    };

    match state.store.set(&key, &value).await {
        Ok(()) => {
            tracing::debug!(key = %key, bytes = value.len(), "Ledger write");
            (StatusCode::OK, Json(PutDataResponse::success()))
        }
        // The reason string is passed through so remote clients can
        // classify it the same way.
        Err(WriteError::Rejected(reason) | WriteError::Failed(reason)) => {
            tracing::warn!(key = %key, reason = %reason, "Ledger write failed");
            (StatusCode::BAD_GATEWAY, Json(PutDataResponse::error(reason)))
        }
    }
}

// =============================================================================
// RECORD HANDLERS
// =============================================================================

/// `GET /records?search=&status=`
pub async fn list_records_handler(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref().unwrap_or("").parse::<StatusFilter>() {
        Ok(s) => s,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let filter = RecordFilter::new()
        .search(query.search.as_deref().unwrap_or(""))
        .status(status);

    let outcome = load_all(state.store.as_ref()).await;
    let response = RecordsResponse {
        records: outcome.snapshot.filter(&filter),
        total: outcome.snapshot.len(),
        skipped: outcome.skipped.len(),
        unavailable: outcome.unavailable,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// `GET /records/stats`
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = load_all(state.store.as_ref()).await;
    Json(StatsResponse {
        counts: outcome.snapshot.stats(),
        depth_profile: outcome.snapshot.depth_profile(DEPTH_PROFILE_LIMIT),
        unavailable: outcome.unavailable,
    })
}

/// `POST /records`
pub async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubmitRequest>,
) -> impl IntoResponse {
    let identity = match identity_from(&headers) {
        Ok(i) => i,
        Err(e) => return record_error(&e),
    };
    let fields = match request.into_fields() {
        Ok(f) => f,
        Err(e) => return record_error(&e),
    };

    match RecordLifecycle::new(state.store.as_ref())
        .create(&identity, fields)
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(RecordResponse::success(record))),
        Err(e) => record_error(&e),
    }
}

/// `POST /records/{id}/analyze`
pub async fn analyze_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let identity = match identity_from(&headers) {
        Ok(i) => i,
        Err(e) => return record_error(&e),
    };

    match RecordLifecycle::new(state.store.as_ref())
        .analyze_as(&identity, &RecordId::new(id), state.classifier.as_ref())
        .await
    {
        Ok(record) => (StatusCode::OK, Json(RecordResponse::success(record))),
        Err(e) => record_error(&e),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use subglacial_core::{DecodeError, IndexError, InvalidTransition, Status};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                SubglacialError::Unauthorized {
                    caller: "a".into(),
                    owner: "b".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                SubglacialError::RecordNotFound(RecordId::new("x")),
                StatusCode::NOT_FOUND,
            ),
            (
                SubglacialError::InvalidTransition(InvalidTransition {
                    from: Status::Analyzed,
                    to: Status::Anomaly,
                }),
                StatusCode::CONFLICT,
            ),
            (
                SubglacialError::InvalidField("depth".into()),
                StatusCode::BAD_REQUEST,
            ),
            (SubglacialError::StoreUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                SubglacialError::Write(WriteError::Rejected("user rejected transaction".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                SubglacialError::Orphaned {
                    id: RecordId::new("x"),
                    source: IndexError::Write(WriteError::Failed("reverted".into())),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                SubglacialError::Decode(DecodeError::Malformed("eof".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(identity_from(&headers).is_err());

        headers.insert(RESEARCHER_HEADER, HeaderValue::from_static("   "));
        assert!(identity_from(&headers).is_err());

        headers.insert(RESEARCHER_HEADER, HeaderValue::from_static(" 0xAbC "));
        assert_eq!(identity_from(&headers).expect("identity").as_str(), "0xAbC");

        let long = "a".repeat(MAX_IDENTITY_LENGTH + 1);
        headers.insert(
            RESEARCHER_HEADER,
            HeaderValue::from_str(&long).expect("header"),
        );
        assert!(identity_from(&headers).is_err());
    }
}
