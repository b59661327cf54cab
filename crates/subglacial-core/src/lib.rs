//! # subglacial-core
//!
//! The indexed record store for Subglacial - THE LOGIC.
//!
//! Researchers submit records describing subglacial-lake exploration
//! events. Each record is stored as an opaque blob in a small key/value
//! namespace exposed by a ledger contract, and an index of live record
//! ids is kept alongside under a well-known key.
//!
//! ## Store Contract
//!
//! The ledger offers `available()`, `get(key)`, and `set(key, bytes)`.
//! A single `set` is atomic; nothing spanning two keys is. This crate keeps
//! the index and the per-record blobs consistent within that contract:
//!
//! - Create writes the record blob, then appends to the index
//! - A failed index append leaves an orphan (stored, never listed)
//! - Concurrent appends race; the last writer wins
//! - Bulk loads skip bad records instead of failing
//!
//! ## Architectural Constraints
//!
//! - No network and no runtime: I/O goes through `storage::RecordStore`
//! - Encryption is an opaque byte transform handled outside this crate
//! - Analysis outcomes come from an injected `analysis::Classifier`

// =============================================================================
// MODULES
// =============================================================================

pub mod analysis;
pub mod formats;
pub mod index;
pub mod lifecycle;
pub mod primitives;
pub mod query;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    DecodeError, EncodeError, Identity, IndexError, InvalidTransition, Record, RecordFields,
    RecordId, Status, StoreError, SubglacialError, WriteError,
};

// =============================================================================
// RE-EXPORTS: Record Store
// =============================================================================

pub use analysis::{Classifier, FixedClassifier, RandomClassifier};
pub use index::IndexManager;
pub use lifecycle::RecordLifecycle;
pub use query::{
    DepthBar, LoadOutcome, RecordFilter, SkippedRecord, Snapshot, StatusCounts, StatusFilter,
    load_all,
};
pub use storage::{MemoryStore, RecordStore, RedbStore};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    SnapshotHeader, decode_index, decode_record, decode_record_at, encode_index, encode_record,
    snapshot_from_bytes, snapshot_to_bytes,
};
