//! # Analysis Collaborator
//!
//! Decides the terminal status a pending record moves to.
//!
//! The record store does not analyze anything itself. `Classifier` is the
//! seam: the reference deployment flips a weighted coin, tests and
//! scripted runs use a fixed outcome, and a real computation over the
//! encrypted measurements can be dropped in without touching the
//! lifecycle.

use crate::primitives::DEFAULT_ANOMALY_RATIO;
use crate::{Record, Status};
use rand::Rng;

/// Supplies the outcome of analyzing a record.
///
/// Implementations must return a terminal status; the lifecycle rejects
/// anything else as an invalid transition.
pub trait Classifier: Send + Sync {
    fn classify(&self, record: &Record) -> Status;
}

/// Reference classifier: `Anomaly` with probability `anomaly_ratio`,
/// `Analyzed` otherwise. Ignores the record contents.
#[derive(Debug, Clone, Copy)]
pub struct RandomClassifier {
    anomaly_ratio: f64,
}

impl RandomClassifier {
    /// Create a classifier; the ratio is clamped to `[0, 1]` and NaN
    /// falls back to the default.
    #[must_use]
    pub fn new(anomaly_ratio: f64) -> Self {
        let anomaly_ratio = if anomaly_ratio.is_nan() {
            DEFAULT_ANOMALY_RATIO
        } else {
            anomaly_ratio.clamp(0.0, 1.0)
        };
        Self { anomaly_ratio }
    }

    /// The effective anomaly probability.
    #[must_use]
    pub fn anomaly_ratio(&self) -> f64 {
        self.anomaly_ratio
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ANOMALY_RATIO)
    }
}

impl Classifier for RandomClassifier {
    fn classify(&self, _record: &Record) -> Status {
        if rand::thread_rng().gen_bool(self.anomaly_ratio) {
            Status::Anomaly
        } else {
            Status::Analyzed
        }
    }
}

/// Always returns the same status.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub Status);

impl Classifier for FixedClassifier {
    fn classify(&self, _record: &Record) -> Status {
        self.0
    }
}
