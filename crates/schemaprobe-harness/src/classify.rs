//! Failure tallies by category.
//!
//! Classification itself happens once, at the generation-adapter boundary;
//! this accumulator only counts what was already classified. There is no
//! reclassification after recording.

use std::collections::BTreeMap;

use schemaprobe_types::ErrorCategory;
use serde::Serialize;

/// Monotonic tally of classified failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorClassifier {
    tallies: BTreeMap<ErrorCategory, u64>,
}

impl ErrorClassifier {
    /// Create an empty classifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure of the given category.
    pub fn record(&mut self, category: ErrorCategory) {
        *self.tallies.entry(category).or_insert(0) += 1;
    }

    /// Read-only snapshot of the tallies, keyed by category.
    #[must_use]
    pub const fn tallies(&self) -> &BTreeMap<ErrorCategory, u64> {
        &self.tallies
    }

    /// Total number of failures recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.tallies.values().sum()
    }
}
