//! # Index Manager
//!
//! Owns the list of live record ids stored under `record_keys`.
//!
//! The index is what defines "live": a record blob whose id is not listed
//! here is an orphan and is never loaded.
//!
//! ## Append Race
//!
//! `append` is read-modify-write with no compare-and-swap, because the
//! store has none to offer. Two appends that both read before either
//! writes will each write back a list missing the other's id; the last
//! writer wins and one id is lost. This is not reported as an error.
//! `read_for_update` and `write` are public so the interleaving can be
//! driven step by step.
//!
//! ## Read Policies
//!
//! - `list` is best-effort: absent, unreadable, or malformed reads as empty
//! - `read_for_update` is strict about the read itself: absent or
//!   malformed reads as empty, but a failed `get` is returned, so an
//!   append never writes back a list built from a read that did not happen

use crate::formats::{decode_index, encode_index};
use crate::primitives::INDEX_KEY;
use crate::storage::RecordStore;
use crate::{IndexError, RecordId, StoreError, WriteError};

/// Index operations over a record store.
#[derive(Debug)]
pub struct IndexManager<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> IndexManager<'a, S> {
    /// Create an index manager over `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Read the current list of ids.
    ///
    /// An absent, unreadable, or malformed index reads as empty; the
    /// failure is logged, never propagated.
    pub async fn list(&self) -> Vec<RecordId> {
        let bytes = match self.store.get(INDEX_KEY).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = INDEX_KEY, error = %e, "index read failed, treating as empty");
                return Vec::new();
            }
        };
        if bytes.is_empty() {
            return Vec::new();
        }
        match decode_index(&bytes) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(key = INDEX_KEY, error = %e, "malformed index, treating as empty");
                Vec::new()
            }
        }
    }

    /// Read the current list of ids ahead of a write.
    ///
    /// An absent or malformed index reads as empty. A failed read is
    /// returned as is.
    pub async fn read_for_update(&self) -> Result<Vec<RecordId>, StoreError> {
        let bytes = self.store.get(INDEX_KEY).await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(decode_index(&bytes).unwrap_or_else(|e| {
            tracing::warn!(key = INDEX_KEY, error = %e, "malformed index, starting fresh");
            Vec::new()
        }))
    }

    /// Replace the stored list with `ids`.
    pub async fn write(&self, ids: &[RecordId]) -> Result<(), WriteError> {
        let bytes = encode_index(ids)?;
        self.store.set(INDEX_KEY, &bytes).await
    }

    /// Append `id` to the index.
    ///
    /// Duplicates are not checked; callers supply fresh ids. If the
    /// current index cannot be read, nothing is written.
    pub async fn append(&self, id: RecordId) -> Result<(), IndexError> {
        let mut ids = self.read_for_update().await?;
        ids.push(id);
        self.write(&ids).await?;
        tracing::debug!(len = ids.len(), "index appended");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
