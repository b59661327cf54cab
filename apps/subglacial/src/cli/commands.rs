//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ExportFormat;
use crate::api::{self, AppState};
use crate::config::Config;
use crate::ledger::Backend;
use std::path::{Path, PathBuf};
use subglacial_core::{
    FixedClassifier, Identity, IndexManager, RandomClassifier, Record, RecordFields, RecordFilter,
    RecordId, RecordLifecycle, RecordStore, Status, StatusFilter, SubglacialError, load_all,
    primitives::{DEPTH_PROFILE_LIMIT, now_seconds},
    snapshot_to_bytes,
};

// =============================================================================
// HELPERS
// =============================================================================

/// Validate an output path: the parent directory must exist.
///
/// Returns the path with its parent canonicalized (symlinks and `..`
/// resolved) and the original file name.
fn validate_output_path(path: &Path) -> Result<PathBuf, SubglacialError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SubglacialError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;
    if !canonical_parent.is_dir() {
        return Err(SubglacialError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SubglacialError::Io("Output path has no filename".to_string()))?;
    Ok(canonical_parent.join(filename))
}

fn require_identity(config: &Config) -> Result<Identity, SubglacialError> {
    config
        .identity
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Identity::new)
        .ok_or_else(|| {
            SubglacialError::Config(
                "no identity: pass --identity or set SUBGLACIAL_IDENTITY".to_string(),
            )
        })
}

fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_record(record: &Record) {
    println!("Record {}", record.id);
    println!("  Location:    {}", record.location);
    println!("  Depth:       {} m", record.depth);
    println!("  Temperature: {} C", record.temperature);
    println!("  Salinity:    {}", record.salinity);
    println!("  Life signs:  {}", if record.life_signs { "yes" } else { "no" });
    println!("  Researcher:  {}", record.researcher);
    println!("  Timestamp:   {}", record.timestamp);
    println!("  Status:      {}", record.status);
}

/// Columns for a depth bar of height `fraction`.
#[allow(clippy::float_arithmetic)]
fn bar_width(fraction: f64) -> usize {
    const MAX_WIDTH: f64 = 40.0;
    (fraction.clamp(0.0, 1.0) * MAX_WIDTH).round() as usize
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config, backend: Backend) -> Result<(), SubglacialError> {
    let classifier = RandomClassifier::new(config.anomaly_ratio);

    println!("Subglacial Record Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:          {}", config.host);
    println!("  Port:          {}", config.port);
    println!("  Store:         {}", backend.kind());
    match &backend {
        Backend::Redb(_) => println!("  Database:      {}", config.database.display()),
        Backend::Remote(client) => println!("  Ledger:        {}", client.base_url()),
        Backend::Memory(_) => {}
    }
    println!("  Anomaly ratio: {}", classifier.anomaly_ratio());
    println!();
    println!("Endpoints:");
    println!("  GET  /available             - Ledger availability");
    println!("  GET  /data/{{key}}            - Read a blob");
    println!("  PUT  /data/{{key}}            - Write a blob");
    println!("  GET  /records               - List records");
    println!("  GET  /records/stats         - Status counts");
    println!("  POST /records               - Submit a record");
    println!("  POST /records/{{id}}/analyze  - Analyze a record");
    println!("  GET  /health                - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.host, config.port);
    api::run_server(&addr, AppState::new(backend, classifier)).await
}

// =============================================================================
// SUBMIT COMMAND
// =============================================================================

/// Submit a record owned by the configured identity.
pub async fn cmd_submit(
    config: &Config,
    backend: &Backend,
    json_mode: bool,
    fields: RecordFields,
) -> Result<(), SubglacialError> {
    let identity = require_identity(config)?;
    let record = RecordLifecycle::new(backend).create(&identity, fields).await?;

    if json_mode {
        print_json(&record);
    } else {
        println!("Submitted record {}", record.id);
    }
    Ok(())
}

// =============================================================================
// ANALYZE COMMAND
// =============================================================================

/// Analyze a pending record owned by the configured identity.
pub async fn cmd_analyze(
    config: &Config,
    backend: &Backend,
    json_mode: bool,
    id: &str,
    outcome: Option<Status>,
) -> Result<(), SubglacialError> {
    let identity = require_identity(config)?;
    let lifecycle = RecordLifecycle::new(backend);
    let id = RecordId::new(id);

    let record = match outcome {
        Some(status) => {
            lifecycle
                .analyze_as(&identity, &id, &FixedClassifier(status))
                .await?
        }
        None => {
            let classifier = RandomClassifier::new(config.anomaly_ratio);
            lifecycle.analyze_as(&identity, &id, &classifier).await?
        }
    };

    if json_mode {
        print_json(&record);
    } else {
        println!("Record {} is now {}", record.id, record.status);
    }
    Ok(())
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List records matching `search` and `status`.
pub async fn cmd_list(
    backend: &Backend,
    json_mode: bool,
    search: Option<&str>,
    status: Option<&str>,
) -> Result<(), SubglacialError> {
    let filter = RecordFilter::new()
        .search(search.unwrap_or(""))
        .status(status.unwrap_or("").parse::<StatusFilter>()?);

    let outcome = load_all(backend).await;
    if outcome.unavailable {
        return Err(SubglacialError::StoreUnavailable);
    }
    let records = outcome.snapshot.filter(&filter);

    if json_mode {
        print_json(&serde_json::json!({
            "records": records,
            "total": outcome.snapshot.len(),
            "skipped": outcome.skipped,
        }));
        return Ok(());
    }

    if records.is_empty() {
        println!("No records found");
    }
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_record(record);
    }
    for skipped in &outcome.skipped {
        eprintln!("warning: skipped {}: {}", skipped.id, skipped.reason);
    }
    Ok(())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show status counts and the depth profile.
pub async fn cmd_stats(backend: &Backend, json_mode: bool) -> Result<(), SubglacialError> {
    let outcome = load_all(backend).await;
    let counts = outcome.snapshot.stats();
    let profile = outcome.snapshot.depth_profile(DEPTH_PROFILE_LIMIT);

    if json_mode {
        print_json(&serde_json::json!({
            "store": backend.kind(),
            "unavailable": outcome.unavailable,
            "total": counts.total,
            "pending": counts.pending,
            "analyzed": counts.analyzed,
            "anomaly": counts.anomaly,
            "skipped": outcome.skipped.len(),
            "depth_profile": profile,
        }));
        return Ok(());
    }

    println!("Subglacial Record Status");
    println!("========================");
    println!("Store: {}", backend.kind());
    if outcome.unavailable {
        println!("(store unavailable)");
        return Ok(());
    }
    println!();
    println!("Total:    {}", counts.total);
    println!("Pending:  {}", counts.pending);
    println!("Analyzed: {}", counts.analyzed);
    println!("Anomaly:  {}", counts.anomaly);
    if !outcome.skipped.is_empty() {
        println!("Skipped:  {}", outcome.skipped.len());
    }

    if !profile.is_empty() {
        println!();
        println!("Depth profile:");
        for bar in &profile {
            let width = bar_width(bar.fraction);
            println!(
                "  {:<24} {:>8} m {}{}",
                bar.location,
                bar.depth,
                "#".repeat(width),
                if bar.life_signs { " *" } else { "" }
            );
        }
    }
    Ok(())
}

// =============================================================================
// INDEX COMMAND
// =============================================================================

/// Print the ids listed in the index, in stored order.
pub async fn cmd_index(backend: &Backend, json_mode: bool) -> Result<(), SubglacialError> {
    if !backend.available().await {
        return Err(SubglacialError::StoreUnavailable);
    }
    let ids = IndexManager::new(backend).read_for_update().await?;

    if json_mode {
        print_json(&ids);
    } else {
        println!("{} indexed record(s)", ids.len());
        for id in &ids {
            println!("  {}", id);
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write every loadable record to `output`.
pub async fn cmd_export(
    backend: &Backend,
    output: &Path,
    format: ExportFormat,
) -> Result<(), SubglacialError> {
    let validated_output = validate_output_path(output)?;

    let outcome = load_all(backend).await;
    if outcome.unavailable {
        return Err(SubglacialError::StoreUnavailable);
    }
    let records = outcome.snapshot.records();

    let data = match format {
        ExportFormat::Snapshot => snapshot_to_bytes(records, now_seconds())?,
        ExportFormat::Json => serde_json::to_vec_pretty(records)
            .map_err(|e| SubglacialError::Io(format!("JSON export failed: {}", e)))?,
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| SubglacialError::Io(format!("Write export: {}", e)))?;

    println!(
        "Exported {} record(s), {} bytes to {}",
        records.len(),
        data.len(),
        validated_output.display()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
