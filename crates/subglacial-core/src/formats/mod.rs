//! # Formats Module
//!
//! Byte representations used by the record store.
//!
//! - `blob`: the JSON blob stored under ledger keys (records and the index)
//! - `snapshot`: binary export of a loaded snapshot (header + postcard)

pub mod blob;
pub mod snapshot;

pub use blob::{decode_index, decode_record, decode_record_at, encode_index, encode_record};
pub use snapshot::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
