//! # Core Type Definitions
//!
//! This module contains all core types for the Subglacial record store:
//! - Identifiers (`RecordId`, `Identity`)
//! - The record entity (`Record`, `RecordFields`) and its `Status`
//! - Error types (`SubglacialError`, `WriteError`, `DecodeError`, `StoreError`, `IndexError`)
//!
//! ## Wire Names
//!
//! Records serialize with camelCase field names (`lifeSigns`) and lowercase
//! status values (`pending`, `analyzed`, `anomaly`), matching the blobs
//! already present in deployed ledgers.

use crate::primitives::{self, ID_SUFFIX_ALPHABET, ID_SUFFIX_LENGTH};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque, globally unique record identifier.
///
/// Generated client-side as `<unix-millis>-<random base36 suffix>`.
/// Ids read back from the index are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Generate a fresh identifier for a record created at `now_millis`.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(now_millis: i64, rng: &mut R) -> Self {
        let suffix: String = (0..ID_SUFFIX_LENGTH)
            .map(|_| char::from(ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())]))
            .collect();
        Self(format!("{now_millis}-{suffix}"))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store key holding this record's blob.
    #[must_use]
    pub fn key(&self) -> String {
        primitives::record_key(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An already-authenticated caller identity (e.g. a wallet address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    /// Create a new identity from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identity owns a record submitted by `researcher`.
    ///
    /// Address comparison is case-insensitive: checksummed and lower-cased
    /// forms of the same wallet address name the same researcher.
    #[must_use]
    pub fn matches(&self, researcher: &str) -> bool {
        self.0.eq_ignore_ascii_case(researcher)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Analysis status of a record.
///
/// `Pending` is the only non-terminal state. See `Status::transition`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Analyzed,
    Anomaly,
}

impl Status {
    /// All statuses in display order.
    pub const ALL: [Status; 3] = [Status::Pending, Status::Analyzed, Status::Anomaly];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Analyzed => "analyzed",
            Status::Anomaly => "anomaly",
        }
    }

    /// `Analyzed` and `Anomaly` admit no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SubglacialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SubglacialError::InvalidField(format!("unknown status '{s}'")))
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// The caller-supplied part of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub location: String,
    pub depth: f64,
    pub temperature: f64,
    pub salinity: f64,
    #[serde(default)]
    pub life_signs: bool,
}

/// One subglacial-lake exploration event.
///
/// `id`, `timestamp`, and `researcher` are fixed at creation. `status`
/// changes at most once, from `Pending` to a terminal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub location: String,
    pub depth: f64,
    pub temperature: f64,
    pub salinity: f64,
    pub life_signs: bool,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub researcher: String,
    pub status: Status,
}

impl Record {
    /// Assemble a pending record from caller fields.
    #[must_use]
    pub fn pending(id: RecordId, fields: RecordFields, researcher: &Identity, timestamp: i64) -> Self {
        Self {
            id,
            location: fields.location,
            depth: fields.depth,
            temperature: fields.temperature,
            salinity: fields.salinity,
            life_signs: fields.life_signs,
            timestamp,
            researcher: researcher.as_str().to_string(),
            status: Status::Pending,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// A `set` call on the store failed. Nothing was stored under that key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The signer declined the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The write was attempted and failed (reverted, dropped, I/O).
    #[error("write failed: {0}")]
    Failed(String),
}

impl WriteError {
    /// Classify a raw failure reason reported by the ledger or wallet.
    #[must_use]
    pub fn from_reason(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.to_ascii_lowercase().contains("user rejected transaction") {
            Self::Rejected(reason)
        } else {
            Self::Failed(reason)
        }
    }
}

/// A blob could not be turned back into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bytes are not a structurally valid blob.
    #[error("malformed blob: {0}")]
    Malformed(String),

    /// The blob exceeds the size accepted by the decoder.
    #[error("blob of {size} bytes exceeds maximum {max} bytes")]
    TooLarge { size: usize, max: usize },
}

/// A value could not be turned into a blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A measurement is NaN or infinite and has no blob representation.
    #[error("field '{0}' must be a finite number")]
    NonFinite(&'static str),

    /// The serializer rejected the value.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl From<EncodeError> for WriteError {
    fn from(err: EncodeError) -> Self {
        Self::Failed(err.to_string())
    }
}

/// A `get` call on the store failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store reported itself unavailable.
    #[error("store unavailable")]
    Unavailable,

    /// The read was attempted and failed.
    #[error("read failed: {0}")]
    Read(String),
}

/// An index append failed, either reading the current list or writing it back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The current index could not be read; nothing was written.
    #[error("index read failed: {0}")]
    Read(#[from] StoreError),

    /// The updated index could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Only `Pending` records can be analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
}

/// Errors that can occur in the Subglacial system.
///
/// - Single-record operations surface every variant to the caller
/// - Bulk loads degrade instead: see `query::load_all`
#[derive(Debug, Error)]
pub enum SubglacialError {
    /// The store availability probe failed.
    #[error("record store unavailable")]
    StoreUnavailable,

    /// A `set` call failed before anything was persisted.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The record blob was written but the index append failed.
    #[error("record {id} stored but not indexed: {source}")]
    Orphaned {
        id: RecordId,
        #[source]
        source: IndexError,
    },

    /// A blob did not parse.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A read call failed.
    #[error(transparent)]
    Read(StoreError),

    /// No blob is stored for the requested id.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// The record is not in a state that allows the requested change.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The caller does not own the record.
    #[error("identity {caller} may not modify a record owned by {owner}")]
    Unauthorized { caller: String, owner: String },

    /// A caller-supplied field was rejected.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// An I/O error occurred outside the store protocol.
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<EncodeError> for SubglacialError {
    fn from(err: EncodeError) -> Self {
        Self::InvalidField(err.to_string())
    }
}

impl From<StoreError> for SubglacialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => Self::StoreUnavailable,
            other => Self::Read(other),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_id_has_millis_and_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = RecordId::generate(1_700_000_000_123, &mut rng);
        let (millis, suffix) = id.as_str().split_once('-').expect("dash");

        assert_eq!(millis, "1700000000123");
        assert_eq!(suffix.len(), ID_SUFFIX_LENGTH);
        assert!(suffix.bytes().all(|b| ID_SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn generated_ids_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = RecordId::generate(1, &mut rng);
        let b = RecordId::generate(1, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn generated_id_never_aliases_index_key() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = RecordId::generate(0, &mut rng);
        assert_ne!(id.key(), primitives::INDEX_KEY);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("Analyzed".parse::<Status>().expect("parse"), Status::Analyzed);
        assert_eq!(" anomaly ".parse::<Status>().expect("parse"), Status::Anomaly);
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!Status::Pending.is_terminal());
        assert!(Status::Analyzed.is_terminal());
        assert!(Status::Anomaly.is_terminal());
    }

    #[test]
    fn identity_matches_ignoring_case() {
        let me = Identity::new("0xAbCdEf");
        assert!(me.matches("0xabcdef"));
        assert!(!me.matches("0xabcde0"));
    }

    #[test]
    fn write_error_detects_user_rejection() {
        assert!(matches!(
            WriteError::from_reason("MetaMask: User rejected transaction signature"),
            WriteError::Rejected(_)
        ));
        assert!(matches!(
            WriteError::from_reason("execution reverted"),
            WriteError::Failed(_)
        ));
    }

    #[test]
    fn unavailable_read_maps_to_store_unavailable() {
        let err: SubglacialError = StoreError::Unavailable.into();
        assert!(matches!(err, SubglacialError::StoreUnavailable));
    }
}
