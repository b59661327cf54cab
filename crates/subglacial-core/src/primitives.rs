//! # Store Primitives
//!
//! Hardcoded keys, limits, and format constants for the record store.
//!
//! The ledger exposes a flat key/value namespace. The record store claims
//! two kinds of keys inside it:
//!
//! 1. **Index key**: `record_keys`, holding the ordered list of live ids.
//! 2. **Record keys**: `record_<id>`, one encoded blob per record.
//!
//! The id `keys` is reserved, since its record key is the index key.

use std::time::{SystemTime, UNIX_EPOCH};

/// Well-known key holding the Index blob.
pub const INDEX_KEY: &str = "record_keys";

/// Prefix of every per-record key (`record_<id>`).
pub const RECORD_KEY_PREFIX: &str = "record_";

/// Magic bytes for the snapshot export header.
///
/// - File Header = Magic Bytes ("SGLK") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"SGLK";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the random suffix in generated record ids.
pub const ID_SUFFIX_LENGTH: usize = 7;

/// Alphabet used for the random id suffix (base36, lowercase).
pub const ID_SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Default probability that the reference classifier reports an anomaly.
pub const DEFAULT_ANOMALY_RATIO: f64 = 0.2;

/// Floor for the depth profile scale, in meters.
///
/// Bars are drawn relative to `max(deepest record, DEPTH_PROFILE_FLOOR)`.
pub const DEPTH_PROFILE_FLOOR: f64 = 1000.0;

/// Number of records shown in the depth profile by default.
pub const DEPTH_PROFILE_LIMIT: usize = 5;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of a single blob read from or written to the store.
///
/// Checked before any parsing so a corrupted key cannot force a large
/// allocation inside the decoder.
pub const MAX_BLOB_SIZE: usize = 1024 * 1024;

/// Maximum length for the free-text location field.
pub const MAX_LOCATION_LENGTH: usize = 512;

/// Maximum length for an identity string.
pub const MAX_IDENTITY_LENGTH: usize = 256;

/// Id reserved for the index: `record_key(RESERVED_ID) == INDEX_KEY`.
pub const RESERVED_ID: &str = "keys";

/// Key to store a record under.
#[must_use]
pub fn record_key(id: &str) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Current wall-clock time in seconds since the Unix epoch.
#[must_use]
pub fn now_seconds() -> i64 {
    now_millis().div_euclid(1000)
}
