//! # Storage Module
//!
//! The key/value service the record store is layered on.
//!
//! The ledger contract offers three calls and nothing else:
//! - `available()`: liveness probe, checked before every sequence
//! - `get(key)`: empty bytes mean "absent", never an error
//! - `set(key, bytes)`: atomic for one key; two calls are never atomic
//!   as a pair
//!
//! There is no multi-key transaction and no compare-and-swap. Everything
//! above this trait is written to stay correct (or degrade in a documented
//! way) under exactly that contract.
//!
//! ## Backends
//!
//! - `MemoryStore`: in-process map with fault injection
//! - `RedbStore`: disk-backed map (redb), a local ledger emulator

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::{StoreError, WriteError};
use std::future::Future;
use std::sync::Arc;

/// Asynchronous key/value store holding index and record blobs.
///
/// Every call may suspend for an unbounded time. Dropping the returned
/// future abandons the call; implementations hold no state across the
/// suspension other than the in-flight request itself.
pub trait RecordStore: Send + Sync {
    /// Whether the store currently accepts reads and writes.
    fn available(&self) -> impl Future<Output = bool> + Send;

    /// Read the bytes under `key`. Empty means absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    /// Replace the bytes under `key` in one atomic write.
    fn set(&self, key: &str, value: &[u8])
    -> impl Future<Output = Result<(), WriteError>> + Send;
}

impl<S: RecordStore> RecordStore for Arc<S> {
    async fn available(&self) -> bool {
        self.as_ref().available().await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), WriteError> {
        self.as_ref().set(key, value).await
    }
}
