//! # In-Memory Store
//!
//! A `RecordStore` kept in a `BTreeMap`, with switches for the failure
//! modes a real ledger exhibits: going unavailable, and rejecting writes
//! (globally or to one key).

use super::RecordStore;
use crate::{StoreError, WriteError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process key/value store.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    rejected_keys: Mutex<BTreeSet<String>>,
    available: AtomicBool,
    reject_all: AtomicBool,
    writes: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            rejected_keys: Mutex::new(BTreeSet::new()),
            available: AtomicBool::new(true),
            reject_all: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Create a new empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the availability probe.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Reject every subsequent write until re-enabled.
    pub fn reject_all_writes(&self, reject: bool) {
        self.reject_all.store(reject, Ordering::SeqCst);
    }

    /// Reject subsequent writes to `key`.
    pub fn reject_writes_to(&self, key: impl Into<String>) {
        lock(&self.rejected_keys).insert(key.into());
    }

    /// Accept writes to `key` again.
    pub fn accept_writes_to(&self, key: &str) {
        lock(&self.rejected_keys).remove(key);
    }

    /// Store bytes directly, bypassing availability and fault switches.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        lock(&self.entries).insert(key.into(), value.into());
    }

    /// Bytes currently stored under `key`, if any.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).cloned()
    }

    /// All keys, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RecordStore for MemoryStore {
    async fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(lock(&self.entries).get(key).cloned().unwrap_or_default())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), WriteError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(WriteError::Failed("store unavailable".to_string()));
        }
        if self.reject_all.load(Ordering::SeqCst) || lock(&self.rejected_keys).contains(key) {
            return Err(WriteError::Rejected(format!("user rejected transaction: write to '{key}'")));
        }
        lock(&self.entries).insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_key_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.get("nothing").await.expect("get").is_empty());
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set("k", b"v").await.expect("set");
        assert_eq!(store.get("k").await.expect("get"), b"v");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn unavailable_store_refuses_reads_and_writes() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(!store.available().await);
        assert_eq!(store.get("k").await, Err(StoreError::Unavailable));
        assert!(store.set("k", b"v").await.is_err());
        assert_eq!(store.raw("k"), None);
    }

    #[tokio::test]
    async fn rejected_key_leaves_previous_value() {
        let store = MemoryStore::new();
        store.set("k", b"old").await.expect("set");
        store.reject_writes_to("k");

        assert!(matches!(
            store.set("k", b"new").await,
            Err(WriteError::Rejected(_))
        ));
        assert_eq!(store.raw("k").as_deref(), Some(&b"old"[..]));

        store.accept_writes_to("k");
        store.set("k", b"new").await.expect("set");
        assert_eq!(store.raw("k").as_deref(), Some(&b"new"[..]));
    }
}
