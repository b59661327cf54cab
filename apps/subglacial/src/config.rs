//! # Configuration
//!
//! Layered settings for the server and CLI.
//!
//! Precedence, lowest to highest:
//! 1. Built-in defaults
//! 2. `subglacial.toml` (or the file passed with `--config`)
//! 3. `SUBGLACIAL_*` environment variables
//! 4. CLI flags (applied by the caller)
//!
//! Every key in the file is optional.
//!
//! ```toml
//! store = "redb"
//! database = "subglacial.redb"
//! identity = "0x00000000000000000000000000000000000000aa"
//! anomaly_ratio = 0.2
//! host = "127.0.0.1"
//! port = 8080
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use subglacial_core::SubglacialError;
use subglacial_core::primitives::DEFAULT_ANOMALY_RATIO;

/// Config file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "subglacial.toml";

/// Largest config file we are willing to parse (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// =============================================================================
// STORE KIND
// =============================================================================

/// Which ledger backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local map; lost on exit.
    Memory,
    /// Local redb file emulating the ledger.
    #[default]
    Redb,
    /// Another subglacial server's ledger gateway, over HTTP.
    Remote,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = SubglacialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            "remote" => Ok(Self::Remote),
            other => Err(SubglacialError::Config(format!(
                "unknown store '{}' (expected memory, redb, or remote)",
                other
            ))),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreKind,
    pub database: PathBuf,
    pub ledger_url: Option<String>,
    pub identity: Option<String>,
    pub anomaly_ratio: f64,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            database: PathBuf::from("subglacial.redb"),
            ledger_url: None,
            identity: None,
            anomaly_ratio: DEFAULT_ANOMALY_RATIO,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, SubglacialError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_from(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, SubglacialError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            SubglacialError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(SubglacialError::Config(format!(
                "'{}' is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            SubglacialError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, SubglacialError> {
        toml::from_str(text).map_err(|e| SubglacialError::Config(e.to_string()))
    }

    /// Overlay `SUBGLACIAL_*` variables looked up through `lookup`.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SubglacialError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(store) = get("SUBGLACIAL_STORE") {
            self.store = store.parse()?;
        }
        if let Some(db) = get("SUBGLACIAL_DB") {
            self.database = PathBuf::from(db);
        }
        if let Some(url) = get("SUBGLACIAL_LEDGER_URL") {
            self.ledger_url = Some(url);
        }
        if let Some(identity) = get("SUBGLACIAL_IDENTITY") {
            self.identity = Some(identity);
        }
        if let Some(ratio) = get("SUBGLACIAL_ANOMALY_RATIO") {
            self.anomaly_ratio = ratio.trim().parse().map_err(|_| {
                SubglacialError::Config(format!("SUBGLACIAL_ANOMALY_RATIO '{}' is not a number", ratio))
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml_str("").expect("parse"), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str("store = \"memory\"\nport = 9000\n").expect("parse");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.anomaly_ratio, DEFAULT_ANOMALY_RATIO);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            Config::from_toml_str("stroe = \"memory\""),
            Err(SubglacialError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml_str("store = \"memory\"\nidentity = \"0xfile\"").expect("parse");
        config
            .apply_env_from(env(&[
                ("SUBGLACIAL_STORE", "remote"),
                ("SUBGLACIAL_LEDGER_URL", "http://ledger:8080"),
                ("SUBGLACIAL_IDENTITY", "0xenv"),
                ("SUBGLACIAL_ANOMALY_RATIO", "0.5"),
            ]))
            .expect("env");
        assert_eq!(config.store, StoreKind::Remote);
        assert_eq!(config.ledger_url.as_deref(), Some("http://ledger:8080"));
        assert_eq!(config.identity.as_deref(), Some("0xenv"));
        assert_eq!(config.anomaly_ratio, 0.5);
    }

    #[test]
    fn test_blank_env_ignored() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[("SUBGLACIAL_DB", "  ")]))
            .expect("env");
        assert_eq!(config.database, PathBuf::from("subglacial.redb"));
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = Config::default();
        assert!(
            config
                .apply_env_from(env(&[("SUBGLACIAL_STORE", "postgres")]))
                .is_err()
        );
        assert!(
            config
                .apply_env_from(env(&[("SUBGLACIAL_ANOMALY_RATIO", "lots")]))
                .is_err()
        );
    }

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("REDB".parse::<StoreKind>().expect("parse"), StoreKind::Redb);
        assert_eq!(StoreKind::Memory.to_string(), "memory");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("subglacial.toml");
        std::fs::write(&path, "database = \"/tmp/ledger.redb\"\n").expect("write");
        let config = Config::from_file(&path).expect("load");
        assert_eq!(config.database, PathBuf::from("/tmp/ledger.redb"));

        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
