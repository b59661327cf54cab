//! # Query Module
//!
//! Loads the full record set and derives read-only views from it.
//!
//! - `load_all` walks the index and decodes each record blob
//! - `Snapshot` is the immutable result, newest first
//! - `RecordFilter` narrows a snapshot without touching it
//!
//! ## Partial Failure
//!
//! One bad record never prevents the rest from loading. Ids whose blob is
//! absent, unreadable, or malformed are logged and reported in
//! `LoadOutcome::skipped`, and the load carries on.
//!
//! ## Refresh
//!
//! There is no shared cache. Refreshing means calling `load_all` again and
//! swapping in the new `Snapshot`; concurrent refreshes each produce their
//! own snapshot and never observe each other's partial state.

use crate::formats::decode_record_at;
use crate::index::IndexManager;
use crate::primitives::DEPTH_PROFILE_FLOOR;
use crate::storage::RecordStore;
use crate::{Record, RecordId, Status, SubglacialError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable, cheaply clonable view of the loaded records.
///
/// Ordered by `timestamp` descending; equal timestamps keep index order.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Arc<[Record]>,
}

impl Snapshot {
    /// Build a snapshot, sorting `records` newest first (stable).
    #[must_use]
    pub fn from_records(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self {
            records: records.into(),
        }
    }

    /// All records in snapshot order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by id.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Records matching `filter`, in snapshot order.
    #[must_use]
    pub fn filter(&self, filter: &RecordFilter) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Count records per status.
    #[must_use]
    pub fn stats(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            total: self.records.len(),
            ..StatusCounts::default()
        };
        for record in self.records.iter() {
            match record.status {
                Status::Pending => counts.pending += 1,
                Status::Analyzed => counts.analyzed += 1,
                Status::Anomaly => counts.anomaly += 1,
            }
        }
        counts
    }

    /// Depth bars for the first `limit` records.
    ///
    /// Each bar is scaled against the deepest record in the whole snapshot,
    /// but never against less than `DEPTH_PROFILE_FLOOR`.
    #[must_use]
    #[allow(clippy::float_arithmetic)]
    pub fn depth_profile(&self, limit: usize) -> Vec<DepthBar> {
        let scale = self
            .records
            .iter()
            .map(|r| r.depth)
            .fold(DEPTH_PROFILE_FLOOR, f64::max);

        self.records
            .iter()
            .take(limit)
            .map(|r| DepthBar {
                id: r.id.clone(),
                location: r.location.clone(),
                depth: r.depth,
                fraction: (r.depth / scale).clamp(0.0, 1.0),
                life_signs: r.life_signs,
            })
            .collect()
    }
}

/// Per-status record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub analyzed: usize,
    pub anomaly: usize,
}

/// One bar of the depth profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthBar {
    pub id: RecordId,
    pub location: String,
    pub depth: f64,
    /// Bar height in `[0, 1]`.
    pub fraction: f64,
    pub life_signs: bool,
}

// =============================================================================
// FILTERING
// =============================================================================

/// Status half of a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl FromStr for StatusFilter {
    type Err = SubglacialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Free-text search plus status match. Pure; never mutates records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    search: String,
    status: StatusFilter,
}

impl RecordFilter {
    /// A filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match records whose location or researcher contains `term`,
    /// ignoring case.
    #[must_use]
    pub fn search(mut self, term: impl AsRef<str>) -> Self {
        self.search = term.as_ref().to_lowercase();
        self
    }

    /// Match records with exactly this status (or any, for `All`).
    #[must_use]
    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Whether `record` passes both halves of the filter.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let matches_search = self.search.is_empty()
            || record.location.to_lowercase().contains(&self.search)
            || record.researcher.to_lowercase().contains(&self.search);
        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => record.status == status,
        };
        matches_search && matches_status
    }
}

// =============================================================================
// LOADING
// =============================================================================

/// An indexed id that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub id: RecordId,
    pub reason: String,
}

/// Result of a bulk load.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub snapshot: Snapshot,
    /// The availability probe failed; the snapshot is empty.
    pub unavailable: bool,
    pub skipped: Vec<SkippedRecord>,
}

/// Load every indexed record.
///
/// Never fails: an unavailable store yields an empty snapshot with
/// `unavailable` set, and per-record failures are skipped.
pub async fn load_all<S: RecordStore>(store: &S) -> LoadOutcome {
    if !store.available().await {
        tracing::warn!("record store unavailable, returning empty snapshot");
        return LoadOutcome {
            unavailable: true,
            ..LoadOutcome::default()
        };
    }

    let ids = IndexManager::new(store).list().await;
    let mut records = Vec::with_capacity(ids.len());
    let mut skipped = Vec::new();

    for id in ids {
        let reason = match store.get(&id.key()).await {
            Ok(bytes) if bytes.is_empty() => "blob absent".to_string(),
            Ok(bytes) => match decode_record_at(&id, &bytes) {
                Ok(record) => {
                    records.push(record);
                    continue;
                }
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };
        tracing::warn!(record_id = %id, reason = %reason, "skipping record");
        skipped.push(SkippedRecord { id, reason });
    }

    tracing::debug!(loaded = records.len(), skipped = skipped.len(), "records loaded");
    LoadOutcome {
        snapshot: Snapshot::from_records(records),
        unavailable: false,
        skipped,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::encode_record;
    use crate::primitives::INDEX_KEY;
    use crate::storage::MemoryStore;

    fn record(id: &str, location: &str, timestamp: i64, status: Status) -> Record {
        Record {
            id: RecordId::new(id),
            location: location.to_string(),
            depth: 1000.0,
            temperature: -2.0,
            salinity: 0.5,
            life_signs: false,
            timestamp,
            researcher: "0xResearcher".to_string(),
            status,
        }
    }

    async fn seed(store: &MemoryStore, records: &[Record]) {
        let index = IndexManager::new(store);
        for r in records {
            store.insert_raw(r.id.key(), encode_record(r).expect("encode"));
            index.append(r.id.clone()).await.expect("append");
        }
    }

    #[tokio::test]
    async fn sorted_newest_first() {
        let store = MemoryStore::new();
        seed(
            &store,
            &[
                record("a", "Lake A", 100, Status::Pending),
                record("b", "Lake B", 300, Status::Pending),
                record("c", "Lake C", 200, Status::Pending),
            ],
        )
        .await;

        let outcome = load_all(&store).await;
        let timestamps: Vec<i64> = outcome
            .snapshot
            .records()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(timestamps, vec![300, 200, 100]);
    }

    #[test]
    fn equal_timestamps_keep_index_order() {
        let snapshot = Snapshot::from_records(vec![
            record("first", "Lake A", 5, Status::Pending),
            record("second", "Lake B", 5, Status::Pending),
            record("newer", "Lake C", 6, Status::Pending),
        ]);
        let ids: Vec<&str> = snapshot.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "first", "second"]);
    }

    #[tokio::test]
    async fn malformed_and_missing_blobs_are_skipped() {
        let store = MemoryStore::new();
        seed(
            &store,
            &[
                record("a", "Lake A", 1, Status::Pending),
                record("b", "Lake B", 2, Status::Analyzed),
            ],
        )
        .await;
        store.insert_raw("record_bad", b"{oops".to_vec());
        let index = IndexManager::new(&store);
        index.append(RecordId::new("bad")).await.expect("append");
        index.append(RecordId::new("gone")).await.expect("append");

        let outcome = load_all(&store).await;
        assert!(!outcome.unavailable);
        assert_eq!(outcome.snapshot.len(), 2);
        let skipped: Vec<&str> = outcome.skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skipped, vec!["bad", "gone"]);
    }

    #[tokio::test]
    async fn orphans_are_invisible() {
        let store = MemoryStore::new();
        let orphan = record("orphan", "Lake O", 1, Status::Pending);
        store.insert_raw(orphan.id.key(), encode_record(&orphan).expect("encode"));

        assert!(load_all(&store).await.snapshot.is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_degrades_to_empty() {
        let store = MemoryStore::new();
        seed(&store, &[record("a", "Lake A", 1, Status::Pending)]).await;
        store.set_available(false);

        let outcome = load_all(&store).await;
        assert!(outcome.unavailable);
        assert!(outcome.snapshot.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn malformed_index_loads_nothing() {
        let store = MemoryStore::new();
        seed(&store, &[record("a", "Lake A", 1, Status::Pending)]).await;
        store.insert_raw(INDEX_KEY, b"not json".to_vec());

        let outcome = load_all(&store).await;
        assert!(!outcome.unavailable);
        assert!(outcome.snapshot.is_empty());
    }

    #[test]
    fn search_and_status_filters() {
        let snapshot = Snapshot::from_records(vec![
            record("1", "Lake Vostok", 2, Status::Pending),
            record("2", "Lake Ellsworth", 1, Status::Analyzed),
        ]);

        let by_search = snapshot.filter(&RecordFilter::new().search("VoStOk"));
        assert_eq!(by_search.len(), 1);
        assert_eq!(by_search[0].location, "Lake Vostok");

        let by_status =
            snapshot.filter(&RecordFilter::new().status("analyzed".parse().expect("parse")));
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].location, "Lake Ellsworth");

        let both = snapshot.filter(
            &RecordFilter::new()
                .search("vostok")
                .status(StatusFilter::Only(Status::Analyzed)),
        );
        assert!(both.is_empty());

        // Filtering never changes the snapshot.
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn search_matches_researcher() {
        let snapshot = Snapshot::from_records(vec![record("1", "Lake Vostok", 2, Status::Pending)]);
        assert_eq!(snapshot.filter(&RecordFilter::new().search("0xresearch")).len(), 1);
        assert!(snapshot.filter(&RecordFilter::new().search("0xother")).is_empty());
    }

    #[test]
    fn status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().expect("parse"), StatusFilter::All);
        assert_eq!("".parse::<StatusFilter>().expect("parse"), StatusFilter::All);
        assert_eq!(
            "Anomaly".parse::<StatusFilter>().expect("parse"),
            StatusFilter::Only(Status::Anomaly)
        );
        assert!("finished".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn stats_count_each_status() {
        let snapshot = Snapshot::from_records(vec![
            record("1", "A", 1, Status::Pending),
            record("2", "B", 2, Status::Analyzed),
            record("3", "C", 3, Status::Analyzed),
            record("4", "D", 4, Status::Anomaly),
        ]);
        assert_eq!(
            snapshot.stats(),
            StatusCounts {
                total: 4,
                pending: 1,
                analyzed: 2,
                anomaly: 1
            }
        );
    }

    #[test]
    fn depth_profile_scales_against_floor_and_maximum() {
        let mut shallow = record("s", "Shallow", 2, Status::Pending);
        shallow.depth = 250.0;
        let snapshot = Snapshot::from_records(vec![shallow.clone()]);
        assert_eq!(snapshot.depth_profile(5)[0].fraction, 0.25);

        let mut deep = record("d", "Deep", 1, Status::Pending);
        deep.depth = 4000.0;
        let snapshot = Snapshot::from_records(vec![shallow, deep]);
        let bars = snapshot.depth_profile(1);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].location, "Shallow");
        assert_eq!(bars[0].fraction, 0.0625);
    }
}
