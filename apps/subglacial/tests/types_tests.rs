//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use subglacial::api::{
    DataResponse, HealthResponse, PutDataRequest, PutDataResponse, RecordResponse,
    RecordsResponse, StatsResponse, SubmitRequest,
};
use subglacial_core::primitives::MAX_LOCATION_LENGTH;
use subglacial_core::{Record, RecordId, Status, StatusCounts, SubglacialError};

fn record() -> Record {
    Record {
        id: RecordId::new("1700000000000-abc1234"),
        location: "Lake Vostok".to_string(),
        depth: 3769.0,
        temperature: -3.0,
        salinity: 0.4,
        life_signs: true,
        timestamp: 1_700_000_000,
        researcher: "0xfeed".to_string(),
        status: Status::Pending,
    }
}

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

// =============================================================================
// LEDGER GATEWAY TYPES
// =============================================================================

#[test]
fn test_data_response_roundtrip() {
    let json = r#"{"key":"record_keys","value":"WyJhIl0="}"#;
    let data: DataResponse = serde_json::from_str(json).unwrap();
    assert_eq!(data.key, "record_keys");
    assert_eq!(data.value, "WyJhIl0=");
}

#[test]
fn test_put_data_request_shape() {
    let body = PutDataRequest {
        value: "AAE=".to_string(),
    };
    assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"value":"AAE="}"#);
}

#[test]
fn test_put_data_response_constructors() {
    let ok = PutDataResponse::success();
    assert!(ok.success);
    assert!(ok.error.is_none());

    let err = PutDataResponse::error("user rejected transaction");
    assert!(!err.success);
    assert_eq!(err.error.as_deref(), Some("user rejected transaction"));
}

// =============================================================================
// SUBMIT REQUEST TESTS
// =============================================================================

#[test]
fn test_submit_request_camel_case_and_default_life_signs() {
    let json = r#"{"location":" Lake Ellsworth ","depth":3000,"temperature":-2,"salinity":0.1}"#;
    let request: SubmitRequest = serde_json::from_str(json).unwrap();
    assert!(!request.life_signs);

    let fields = request.into_fields().unwrap();
    assert_eq!(fields.location, "Lake Ellsworth");
    assert_eq!(fields.depth, 3000.0);
}

#[test]
fn test_submit_request_reads_life_signs() {
    let json = r#"{"location":"x","depth":1,"temperature":1,"salinity":1,"lifeSigns":true}"#;
    let request: SubmitRequest = serde_json::from_str(json).unwrap();
    assert!(request.life_signs);
}

#[test]
fn test_submit_request_missing_measurement_rejected() {
    let json = r#"{"location":"x","depth":1,"temperature":1}"#;
    assert!(serde_json::from_str::<SubmitRequest>(json).is_err());
}

#[test]
fn test_submit_request_location_limits() {
    let blank = SubmitRequest {
        location: "  ".to_string(),
        depth: 1.0,
        temperature: 1.0,
        salinity: 1.0,
        life_signs: false,
    };
    assert!(matches!(
        blank.into_fields(),
        Err(SubglacialError::InvalidField(_))
    ));

    let long = SubmitRequest {
        location: "L".repeat(MAX_LOCATION_LENGTH + 1),
        depth: 1.0,
        temperature: 1.0,
        salinity: 1.0,
        life_signs: false,
    };
    assert!(long.into_fields().is_err());
}

// =============================================================================
// RECORD RESPONSE TESTS
// =============================================================================

#[test]
fn test_record_response_uses_record_wire_names() {
    let json = serde_json::to_value(RecordResponse::success(record())).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["record"]["lifeSigns"], true);
    assert_eq!(json["record"]["status"], "pending");
    assert!(json["error"].is_null());
}

#[test]
fn test_record_response_error() {
    let response = RecordResponse::error("record not found");
    assert!(!response.success);
    assert!(response.record.is_none());
}

#[test]
fn test_records_response_deserialization() {
    let json = serde_json::json!({
        "records": [record()],
        "total": 3,
        "skipped": 1,
        "unavailable": false,
    });
    let list: RecordsResponse = serde_json::from_value(json).unwrap();
    assert_eq!(list.records, vec![record()]);
    assert_eq!(list.total, 3);
    assert_eq!(list.skipped, 1);
}

#[test]
fn test_stats_response_flattens_counts() {
    let stats = StatsResponse {
        counts: StatusCounts {
            total: 3,
            pending: 1,
            analyzed: 1,
            anomaly: 1,
        },
        depth_profile: vec![],
        unavailable: false,
    };
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["total"], 3);
    assert_eq!(json["anomaly"], 1);
    assert!(json["depth_profile"].as_array().unwrap().is_empty());
}
