//! # Snapshot Export Format
//!
//! Binary export of a loaded record snapshot, for offline review.
//!
//! Format: Header (5 bytes) + postcard-serialized payload.
//! - 4 bytes: Magic ("SGLK")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is parsed.
//! File I/O operations are in the app layer.

use crate::{DecodeError, EncodeError, Record, primitives};
use serde::{Deserialize, Serialize};

/// Maximum allowed snapshot size (256 MB).
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header preceding all snapshot data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(DecodeError::Malformed("invalid magic bytes".to_string()));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(DecodeError::Malformed(format!(
                "unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::Malformed("header too short".to_string()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Exported payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Seconds since the Unix epoch at export time.
    pub exported_at: i64,
    /// Records in snapshot order (newest first).
    pub records: Vec<Record>,
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize records to bytes (header + payload).
pub fn snapshot_to_bytes(records: &[Record], exported_at: i64) -> Result<Vec<u8>, EncodeError> {
    let file = SnapshotFile {
        exported_at,
        records: records.to_vec(),
    };
    let payload =
        postcard::to_stdvec(&file).map_err(|e| EncodeError::Serialize(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<SnapshotFile, DecodeError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(DecodeError::TooLarge {
            size: bytes.len(),
            max: MAX_SNAPSHOT_SIZE,
        });
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| DecodeError::Malformed(format!("failed to deserialize snapshot: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
