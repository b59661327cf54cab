//! # Record Lifecycle
//!
//! Creation and analysis of records, and the status state machine.
//!
//! ```text
//!            ┌──────────► Analyzed
//!  Pending ──┤
//!            └──────────► Anomaly
//! ```
//!
//! ## Write Sequences
//!
//! Create issues two single-key writes, in this order:
//!
//! 1. `set(record_<id>, blob)`
//! 2. `IndexManager::append(id)`
//!
//! Step 2 never starts unless step 1 succeeded. If step 2 fails, either
//! reading the current index or writing it back, the blob stays behind
//! unindexed (an orphan) and `SubglacialError::Orphaned` is returned; there
//! is no rollback and no repair here.
//!
//! Analyze rewrites the record blob only. The index is not touched.

use crate::analysis::Classifier;
use crate::formats::{decode_record_at, encode_record};
use crate::index::IndexManager;
use crate::primitives::{MAX_IDENTITY_LENGTH, MAX_LOCATION_LENGTH, RESERVED_ID, now_millis};
use crate::storage::RecordStore;
use crate::{Identity, InvalidTransition, Record, RecordFields, RecordId, Status, SubglacialError};

// =============================================================================
// STATE MACHINE
// =============================================================================

impl Status {
    /// Move to `outcome`, if that is a legal transition from `self`.
    ///
    /// Legal: `Pending -> Analyzed`, `Pending -> Anomaly`. Nothing else.
    pub fn transition(self, outcome: Status) -> Result<Status, InvalidTransition> {
        match (self, outcome) {
            (Status::Pending, Status::Analyzed | Status::Anomaly) => Ok(outcome),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

fn validate(identity: &Identity, fields: &RecordFields) -> Result<(), SubglacialError> {
    if identity.as_str().trim().is_empty() {
        return Err(SubglacialError::InvalidField(
            "identity must not be empty".to_string(),
        ));
    }
    if identity.as_str().len() > MAX_IDENTITY_LENGTH {
        return Err(SubglacialError::InvalidField(format!(
            "identity length {} exceeds maximum {}",
            identity.as_str().len(),
            MAX_IDENTITY_LENGTH
        )));
    }
    if fields.location.trim().is_empty() {
        return Err(SubglacialError::InvalidField(
            "location must not be empty".to_string(),
        ));
    }
    if fields.location.len() > MAX_LOCATION_LENGTH {
        return Err(SubglacialError::InvalidField(format!(
            "location length {} exceeds maximum {}",
            fields.location.len(),
            MAX_LOCATION_LENGTH
        )));
    }
    for (name, value) in [
        ("depth", fields.depth),
        ("temperature", fields.temperature),
        ("salinity", fields.salinity),
    ] {
        if !value.is_finite() {
            return Err(SubglacialError::InvalidField(format!(
                "{name} must be a finite number"
            )));
        }
    }
    Ok(())
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create and analyze records in a store.
#[derive(Debug)]
pub struct RecordLifecycle<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> RecordLifecycle<'a, S> {
    /// Create a lifecycle over `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn ensure_available(&self) -> Result<(), SubglacialError> {
        if self.store.available().await {
            Ok(())
        } else {
            Err(SubglacialError::StoreUnavailable)
        }
    }

    /// Create a pending record owned by `identity`.
    pub async fn create(
        &self,
        identity: &Identity,
        fields: RecordFields,
    ) -> Result<Record, SubglacialError> {
        self.create_at(identity, fields, now_millis()).await
    }

    /// Create a pending record as if the current time were `now_millis`.
    pub async fn create_at(
        &self,
        identity: &Identity,
        fields: RecordFields,
        now_millis: i64,
    ) -> Result<Record, SubglacialError> {
        validate(identity, &fields)?;
        self.ensure_available().await?;

        let id = RecordId::generate(now_millis, &mut rand::thread_rng());
        let record = Record::pending(id.clone(), fields, identity, now_millis.div_euclid(1000));
        let bytes = encode_record(&record)?;

        self.store.set(&id.key(), &bytes).await?;

        if let Err(source) = IndexManager::new(self.store).append(id.clone()).await {
            tracing::error!(record_id = %id, error = %source, "record stored but index append failed");
            return Err(SubglacialError::Orphaned { id, source });
        }

        tracing::info!(record_id = %id, researcher = %identity, "record created");
        Ok(record)
    }

    /// Load a single record by id.
    ///
    /// Unlike bulk loads, every failure is surfaced.
    /// The reserved id `keys` never names a record.
    pub async fn load(&self, id: &RecordId) -> Result<Record, SubglacialError> {
        if id.as_str() == RESERVED_ID {
            return Err(SubglacialError::RecordNotFound(id.clone()));
        }
        self.ensure_available().await?;
        let bytes = self.store.get(&id.key()).await?;
        if bytes.is_empty() {
            return Err(SubglacialError::RecordNotFound(id.clone()));
        }
        Ok(decode_record_at(id, &bytes)?)
    }

    /// Analyze a pending record and persist its terminal status.
    ///
    /// # Precondition
    ///
    /// Only the identity matching `record.researcher` may analyze a record.
    /// This method does not check it; use `analyze_as` to enforce it here.
    pub async fn analyze<C: Classifier + ?Sized>(
        &self,
        id: &RecordId,
        classifier: &C,
    ) -> Result<Record, SubglacialError> {
        let record = self.load(id).await?;
        self.apply_analysis(record, classifier).await
    }

    /// Analyze a record on behalf of `identity`, which must own it.
    pub async fn analyze_as<C: Classifier + ?Sized>(
        &self,
        identity: &Identity,
        id: &RecordId,
        classifier: &C,
    ) -> Result<Record, SubglacialError> {
        let record = self.load(id).await?;
        if !identity.matches(&record.researcher) {
            tracing::warn!(record_id = %id, caller = %identity, "analysis refused: not the owner");
            return Err(SubglacialError::Unauthorized {
                caller: identity.as_str().to_string(),
                owner: record.researcher,
            });
        }
        self.apply_analysis(record, classifier).await
    }

    async fn apply_analysis<C: Classifier + ?Sized>(
        &self,
        record: Record,
        classifier: &C,
    ) -> Result<Record, SubglacialError> {
        // Reject before consulting the classifier so terminal records are
        // never re-analyzed, whatever it would return.
        if record.status.is_terminal() {
            return Err(InvalidTransition {
                from: record.status,
                to: record.status,
            }
            .into());
        }
        let status = record.status.transition(classifier.classify(&record))?;
        let updated = Record { status, ..record };

        let bytes = encode_record(&updated)?;
        self.store.set(&updated.id.key(), &bytes).await?;

        tracing::info!(record_id = %updated.id, status = %status, "record analyzed");
        Ok(updated)
    }
}

// =============================================================================
// TESTS
// =============================================================================
