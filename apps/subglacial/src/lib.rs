//! # subglacial
//!
//! Server and CLI around `subglacial-core`.
//!
//! - `api`: axum router exposing the ledger gateway and record endpoints
//! - `cli`: clap commands for the same operations
//! - `config`: layered TOML + environment settings
//! - `ledger`: backend selection (memory, redb, remote gateway)

pub mod api;
pub mod cli;
pub mod config;
pub mod ledger;
