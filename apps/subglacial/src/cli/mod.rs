//! # Subglacial CLI Module
//!
//! This module implements the CLI interface for Subglacial.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `submit` - Submit a new exploration record
//! - `analyze` - Analyze one of your pending records
//! - `list` - List records, newest first
//! - `stats` - Status counts and depth profile
//! - `index` - Print the raw record index
//! - `export` - Write all records to a file

mod commands;

use crate::config::{Config, StoreKind};
use crate::ledger::Backend;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use subglacial_core::{Status, SubglacialError};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Subglacial - exploration record store
///
/// Submits, analyzes, and browses subglacial-lake exploration records kept
/// in a key/value ledger.
#[derive(Parser, Debug)]
#[command(name = "subglacial")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./subglacial.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger backend
    #[arg(short = 'S', long, global = true, value_enum)]
    pub store: Option<StoreArg>,

    /// Path to the redb ledger file
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Base URL of a remote ledger gateway (store = remote)
    #[arg(long, global = true)]
    pub ledger_url: Option<String>,

    /// Researcher identity used for submit and analyze
    #[arg(short, long, global = true)]
    pub identity: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// `--store` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    Memory,
    Redb,
    Remote,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => Self::Memory,
            StoreArg::Redb => Self::Redb,
            StoreArg::Remote => Self::Remote,
        }
    }
}

/// `analyze --outcome` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutcomeArg {
    Analyzed,
    Anomaly,
}

impl From<OutcomeArg> for Status {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Analyzed => Self::Analyzed,
            OutcomeArg::Anomaly => Self::Anomaly,
        }
    }
}

/// `export --format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Binary snapshot (SGLK header + postcard)
    #[default]
    Snapshot,
    /// Pretty-printed JSON array
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Submit a new exploration record
    Submit {
        /// Lake or site name
        #[arg(short, long)]
        location: String,

        /// Depth in meters
        #[arg(short, long, allow_negative_numbers = true)]
        depth: f64,

        /// Water temperature in degrees Celsius
        #[arg(short, long, allow_negative_numbers = true)]
        temperature: f64,

        /// Salinity
        #[arg(short = 'a', long, allow_negative_numbers = true)]
        salinity: f64,

        /// Signs of life were observed
        #[arg(long)]
        life_signs: bool,
    },

    /// Analyze one of your pending records
    Analyze {
        /// Record id
        id: String,

        /// Force the outcome instead of sampling one
        #[arg(long, value_enum)]
        outcome: Option<OutcomeArg>,
    },

    /// List records, newest first
    List {
        /// Case-insensitive match on location or researcher
        #[arg(short, long)]
        search: Option<String>,

        /// all, pending, analyzed, or anomaly
        #[arg(long)]
        status: Option<String>,
    },

    /// Show status counts and the depth profile
    Stats,

    /// Print the raw record index
    Index,

    /// Export every loadable record
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format
        #[arg(short = 't', long, value_enum, default_value_t)]
        format: ExportFormat,
    },
}

// =============================================================================
// CONFIG RESOLUTION
// =============================================================================

impl Cli {
    /// Load the config file and environment, then apply flags on top.
    pub fn resolve_config(&self) -> Result<Config, SubglacialError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(store) = self.store {
            config.store = store.into();
        }
        if let Some(ref database) = self.database {
            config.database = database.clone();
        }
        if let Some(ref url) = self.ledger_url {
            config.ledger_url = Some(url.clone());
        }
        if let Some(ref identity) = self.identity {
            config.identity = Some(identity.clone());
        }
        Ok(config)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SubglacialError> {
    let mut config = cli.resolve_config()?;
    let json_mode = cli.json_mode;

    if let Some(Commands::Server { ref host, port }) = cli.command {
        if let Some(host) = host {
            config.host = host.clone();
        }
        if let Some(port) = port {
            config.port = port;
        }
    }

    let backend = Backend::open(&config)?;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config, backend).await,
        Some(Commands::Submit {
            location,
            depth,
            temperature,
            salinity,
            life_signs,
        }) => {
            let fields = subglacial_core::RecordFields {
                location,
                depth,
                temperature,
                salinity,
                life_signs,
            };
            cmd_submit(&config, &backend, json_mode, fields).await
        }
        Some(Commands::Analyze { id, outcome }) => {
            cmd_analyze(&config, &backend, json_mode, &id, outcome.map(Status::from)).await
        }
        Some(Commands::List { search, status }) => {
            cmd_list(&backend, json_mode, search.as_deref(), status.as_deref()).await
        }
        Some(Commands::Stats) | None => cmd_stats(&backend, json_mode).await,
        Some(Commands::Index) => cmd_index(&backend, json_mode).await,
        Some(Commands::Export { output, format }) => cmd_export(&backend, &output, format).await,
    }
}

// =============================================================================
// TESTS
// =============================================================================
