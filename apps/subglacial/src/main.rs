//! # Subglacial - Exploration Record Server
//!
//! The main binary for the Subglacial record store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  apps/subglacial (THE BINARY)                │
//! │                                                              │
//! │   ┌─────────────┐    ┌──────────────┐    ┌───────────────┐   │
//! │   │    CLI      │    │   HTTP API   │    │ LedgerClient  │   │
//! │   │   (clap)    │    │    (axum)    │    │   (reqwest)   │   │
//! │   └──────┬──────┘    └──────┬───────┘    └───────┬───────┘   │
//! │          └──────────────────┼────────────────────┘           │
//! │                             ▼                                │
//! │                   ┌──────────────────┐                       │
//! │                   │ subglacial-core  │                       │
//! │                   │   (THE LOGIC)    │                       │
//! │                   └──────────────────┘                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Serve a local ledger
//! subglacial --store redb -D lakes.redb server --port 8080
//!
//! # Talk to it from elsewhere
//! subglacial --store remote --ledger-url http://host:8080 -i 0xabc \
//!     submit -l "Lake Vostok" -d 3769 -t -3 -a 0.4
//! subglacial --store remote --ledger-url http://host:8080 list --status pending
//! ```

use clap::Parser;
use subglacial::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SUBGLACIAL_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("SUBGLACIAL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subglacial=info,subglacial_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
   S U B G L A C I A L
  ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

  Exploration Record Store v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
