//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use serde::{Deserialize, Serialize};
use subglacial_core::{
    DepthBar, Record, RecordFields, StatusCounts, SubglacialError,
    primitives::MAX_LOCATION_LENGTH,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// LEDGER GATEWAY
// =============================================================================

/// `GET /available` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailableResponse {
    pub available: bool,
}

/// `GET /data/{key}` response. An empty `value` means the key is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse {
    pub key: String,
    /// Base64 encoded.
    pub value: String,
}

/// `PUT /data/{key}` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutDataRequest {
    /// Base64 encoded.
    pub value: String,
}

/// `PUT /data/{key}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutDataResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl PutDataResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SUBMIT REQUEST
// =============================================================================

/// `POST /records` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub location: String,
    pub depth: f64,
    pub temperature: f64,
    pub salinity: f64,
    #[serde(default)]
    pub life_signs: bool,
}

impl SubmitRequest {
    /// Convert to record fields, rejecting blank or oversized locations
    /// before anything reaches the store.
    pub fn into_fields(self) -> Result<RecordFields, SubglacialError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(SubglacialError::InvalidField(
                "location must not be empty".to_string(),
            ));
        }
        if location.len() > MAX_LOCATION_LENGTH {
            return Err(SubglacialError::InvalidField(format!(
                "location length {} exceeds maximum {} bytes",
                location.len(),
                MAX_LOCATION_LENGTH
            )));
        }
        Ok(RecordFields {
            location: location.to_string(),
            depth: self.depth,
            temperature: self.temperature,
            salinity: self.salinity,
            life_signs: self.life_signs,
        })
    }
}

// =============================================================================
// RECORD RESPONSES
// =============================================================================

/// `GET /records` query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

/// `GET /records` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub records: Vec<Record>,
    /// Records loaded before filtering.
    pub total: usize,
    /// Index entries that could not be loaded.
    pub skipped: usize,
    /// The store was down; `records` is empty rather than an error.
    pub unavailable: bool,
}

/// `GET /records/stats` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub depth_profile: Vec<DepthBar>,
    pub unavailable: bool,
}

/// Single-record response for submit and analyze.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    pub record: Option<Record>,
    pub error: Option<String>,
}

impl RecordResponse {
    pub fn success(record: Record) -> Self {
        Self {
            success: true,
            record: Some(record),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            error: Some(msg.into()),
        }
    }
}
