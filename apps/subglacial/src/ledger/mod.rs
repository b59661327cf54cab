//! # Ledger Backends
//!
//! Runtime selection of the key/value store behind the record layer.
//!
//! - `memory`: `MemoryStore`, for demos and tests
//! - `redb`: `RedbStore`, a local file emulating the ledger
//! - `remote`: `LedgerClient`, another server's ledger gateway

mod client;

pub use client::LedgerClient;

use crate::config::{Config, StoreKind};
use subglacial_core::{MemoryStore, RecordStore, RedbStore, StoreError, SubglacialError, WriteError};

/// The configured ledger store.
#[derive(Debug)]
pub enum Backend {
    Memory(MemoryStore),
    Redb(RedbStore),
    Remote(LedgerClient),
}

impl Backend {
    /// Open the backend named by `config.store`.
    ///
    /// `remote` needs `ledger_url`; the API key for it is read from
    /// `SUBGLACIAL_LEDGER_API_KEY`.
    pub fn open(config: &Config) -> Result<Self, SubglacialError> {
        match config.store {
            StoreKind::Memory => Ok(Self::Memory(MemoryStore::new())),
            StoreKind::Redb => {
                tracing::info!(database = %config.database.display(), "Opening redb ledger");
                Ok(Self::Redb(RedbStore::open(&config.database)?))
            }
            StoreKind::Remote => {
                let url = config.ledger_url.as_deref().ok_or_else(|| {
                    SubglacialError::Config(
                        "store 'remote' needs ledger_url (or --ledger-url)".to_string(),
                    )
                })?;
                let api_key = std::env::var("SUBGLACIAL_LEDGER_API_KEY")
                    .ok()
                    .filter(|k| !k.is_empty());
                tracing::info!(ledger = %url, "Using remote ledger");
                Ok(Self::Remote(LedgerClient::new(url, api_key)?))
            }
        }
    }

    /// Which kind of store this is.
    pub fn kind(&self) -> StoreKind {
        match self {
            Self::Memory(_) => StoreKind::Memory,
            Self::Redb(_) => StoreKind::Redb,
            Self::Remote(_) => StoreKind::Remote,
        }
    }
}

impl RecordStore for Backend {
    async fn available(&self) -> bool {
        match self {
            Self::Memory(s) => s.available().await,
            Self::Redb(s) => s.available().await,
            Self::Remote(s) => s.available().await,
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::Memory(s) => s.get(key).await,
            Self::Redb(s) => s.get(key).await,
            Self::Remote(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), WriteError> {
        match self {
            Self::Memory(s) => s.set(key, value).await,
            Self::Redb(s) => s.set(key, value).await,
            Self::Remote(s) => s.set(key, value).await,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory() {
        let config = Config {
            store: StoreKind::Memory,
            ..Config::default()
        };
        let backend = Backend::open(&config).expect("open");
        assert_eq!(backend.kind(), StoreKind::Memory);
        assert!(backend.available().await);
        backend.set("k", b"v").await.expect("set");
        assert_eq!(backend.get("k").await.expect("get"), b"v");
    }

    #[tokio::test]
    async fn test_open_redb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            store: StoreKind::Redb,
            database: dir.path().join("ledger.redb"),
            ..Config::default()
        };
        let backend = Backend::open(&config).expect("open");
        assert_eq!(backend.kind(), StoreKind::Redb);
        assert!(backend.get("missing").await.expect("get").is_empty());
    }

    #[test]
    fn test_remote_requires_url() {
        let config = Config {
            store: StoreKind::Remote,
            ledger_url: None,
            ..Config::default()
        };
        assert!(matches!(
            Backend::open(&config),
            Err(SubglacialError::Config(_))
        ));
    }
}
