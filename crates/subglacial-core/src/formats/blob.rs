//! # Blob Codec
//!
//! JSON blobs stored under ledger keys. Pure transformations, no I/O.
//!
//! Record blob: a UTF-8 JSON object with camelCase keys in fixed order.
//!
//! ```text
//! {"id":"1700000000123-k3j9x0a","location":"Lake Vostok","depth":3769.0,
//!  "temperature":-3.0,"salinity":0.4,"lifeSigns":false,
//!  "timestamp":1700000000,"researcher":"0xab..","status":"pending"}
//! ```
//!
//! Index blob: a JSON array of id strings, order preserved.
//!
//! ## Compatibility
//!
//! - A missing `status` decodes as `pending` (blobs written before the
//!   field existed).
//! - A missing `id` is accepted by `decode_record_at`, which takes the id
//!   from the key the blob was read from.
//!
//! ## Size Limit
//!
//! Blobs larger than `MAX_BLOB_SIZE` are rejected before parsing.

use crate::primitives::MAX_BLOB_SIZE;
use crate::{DecodeError, EncodeError, Record, RecordId, Status};
use serde::{Deserialize, Serialize};

/// Wire shape of a record blob.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordBlob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    location: String,
    depth: f64,
    temperature: f64,
    salinity: f64,
    life_signs: bool,
    timestamp: i64,
    researcher: String,
    #[serde(default)]
    status: Status,
}

impl RecordBlob {
    fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            location: self.location,
            depth: self.depth,
            temperature: self.temperature,
            salinity: self.salinity,
            life_signs: self.life_signs,
            timestamp: self.timestamp,
            researcher: self.researcher,
            status: self.status,
        }
    }
}

fn check_size(bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.len() > MAX_BLOB_SIZE {
        return Err(DecodeError::TooLarge {
            size: bytes.len(),
            max: MAX_BLOB_SIZE,
        });
    }
    Ok(())
}

fn check_finite(name: &'static str, value: f64) -> Result<(), EncodeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EncodeError::NonFinite(name))
    }
}

fn parse_blob(bytes: &[u8]) -> Result<RecordBlob, DecodeError> {
    check_size(bytes)?;
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
}

// =============================================================================
// RECORDS
// =============================================================================

/// Encode a record into its blob.
///
/// Deterministic: equal records always produce identical bytes.
pub fn encode_record(record: &Record) -> Result<Vec<u8>, EncodeError> {
    check_finite("depth", record.depth)?;
    check_finite("temperature", record.temperature)?;
    check_finite("salinity", record.salinity)?;

    let blob = RecordBlob {
        id: Some(record.id.as_str().to_string()),
        location: record.location.clone(),
        depth: record.depth,
        temperature: record.temperature,
        salinity: record.salinity,
        life_signs: record.life_signs,
        timestamp: record.timestamp,
        researcher: record.researcher.clone(),
        status: record.status,
    };
    serde_json::to_vec(&blob).map_err(|e| EncodeError::Serialize(e.to_string()))
}

/// Decode a self-describing record blob.
///
/// Fails with `DecodeError::Malformed` if the blob carries no `id`.
pub fn decode_record(bytes: &[u8]) -> Result<Record, DecodeError> {
    let mut blob = parse_blob(bytes)?;
    let id = blob
        .id
        .take()
        .ok_or_else(|| DecodeError::Malformed("missing field `id`".to_string()))?;
    Ok(blob.into_record(RecordId(id)))
}

/// Decode the blob read from `record_<id>`.
///
/// The key is authoritative for the id; an embedded `id` that disagrees
/// is ignored.
pub fn decode_record_at(id: &RecordId, bytes: &[u8]) -> Result<Record, DecodeError> {
    let mut blob = parse_blob(bytes)?;
    if let Some(embedded) = blob.id.take()
        && embedded != id.as_str()
    {
        tracing::debug!(key_id = %id, embedded_id = %embedded, "blob id differs from key");
    }
    Ok(blob.into_record(id.clone()))
}

// =============================================================================
// INDEX
// =============================================================================

/// Encode the index as a JSON array of ids.
pub fn encode_index(ids: &[RecordId]) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(ids).map_err(|e| EncodeError::Serialize(e.to_string()))
}

/// Decode an index blob.
pub fn decode_index(bytes: &[u8]) -> Result<Vec<RecordId>, DecodeError> {
    check_size(bytes)?;
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
