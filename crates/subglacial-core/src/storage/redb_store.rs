//! # redb-backed Ledger Store
//!
//! A disk-backed key/value store using the redb embedded database.
//!
//! Stands in for the ledger contract when running locally: one table,
//! string keys, opaque byte values, and one ACID transaction per `set`.
//! Like the ledger, it never offers a transaction spanning two keys to
//! the layers above.

use super::RecordStore;
use crate::{StoreError, SubglacialError, WriteError};
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for ledger data: key string -> blob bytes
const LEDGER: TableDefinition<&str, &[u8]> = TableDefinition::new("ledger");

/// A disk-backed ledger store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SubglacialError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| SubglacialError::Io(e.to_string()))?;

        // Initialize the table so reads on a fresh file succeed.
        let write_txn = db
            .begin_write()
            .map_err(|e| SubglacialError::Io(e.to_string()))?;
        let _ = write_txn
            .open_table(LEDGER)
            .map_err(|e| SubglacialError::Io(e.to_string()))?;
        write_txn
            .commit()
            .map_err(|e| SubglacialError::Io(e.to_string()))?;

        Ok(Self { db })
    }

    /// Number of keys stored.
    pub fn len(&self) -> Result<u64, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let table = read_txn
            .open_table(LEDGER)
            .map_err(|e| StoreError::Read(e.to_string()))?;
        table.len().map_err(|e| StoreError::Read(e.to_string()))
    }

    /// Whether no keys are stored.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        let table = read_txn
            .open_table(LEDGER)
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(table
            .get(key)
            .map_err(|e| StoreError::Read(e.to_string()))?
            .map(|v| v.value().to_vec())
            .unwrap_or_default())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), WriteError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| WriteError::Failed(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(LEDGER)
                .map_err(|e| WriteError::Failed(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| WriteError::Failed(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| WriteError::Failed(e.to_string()))
    }
}

impl RecordStore for RedbStore {
    async fn available(&self) -> bool {
        self.db.begin_read().is_ok()
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.read(key)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), WriteError> {
        self.write(key, value)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn fresh_database_is_available_and_empty() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("ledger.redb")).expect("open");

        assert!(store.available().await);
        assert!(store.is_empty().expect("len"));
        assert!(store.get("record_keys").await.expect("get").is_empty());
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("ledger.redb")).expect("open");

        store.set("k", b"one").await.expect("set");
        store.set("k", b"two").await.expect("set");

        assert_eq!(store.get("k").await.expect("get"), b"two");
        assert_eq!(store.len().expect("len"), 1);
    }

    #[tokio::test]
    async fn values_persist_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("ledger.redb");

        {
            let store = RedbStore::open(&db_path).expect("open");
            store.set("record_keys", b"[\"1-a\"]").await.expect("set");
            store.set("record_1-a", b"{}").await.expect("set");
        }
        // Store dropped here, simulating process exit

        let store = RedbStore::open(&db_path).expect("reopen");
        assert_eq!(store.len().expect("len"), 2);
        assert_eq!(store.get("record_keys").await.expect("get"), b"[\"1-a\"]");
    }
}
