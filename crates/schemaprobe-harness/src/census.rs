//! Field census: per-field presence and shape statistics across a batch of
//! successful payloads.
//!
//! The census is a union over all observed field names, not an
//! intersection: a field absent from one payload simply is not incremented
//! for it. Counts grow monotonically during a run and are read-only at
//! report time.

use std::collections::BTreeMap;

use schemaprobe_types::{FieldShape, Payload};
use serde::Serialize;

/// Generation-service bookkeeping fields, excluded from coverage
/// statistics so they do not dilute the consistency signal.
pub const RESERVED_FIELDS: [&str; 4] = ["id", "user_id", "created_at", "updated_at"];

/// Accumulates how often each field name appears across successful
/// payloads, together with the most recently observed shape per field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldCensus {
    counts: BTreeMap<String, u64>,
    shapes: BTreeMap<String, FieldShape>,
    total_successes: u64,
}

impl FieldCensus {
    /// Create an empty census.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful payload.
    ///
    /// Every non-reserved field increments its occurrence count by one;
    /// `total_successes` increments once per payload, not per field.
    pub fn record(&mut self, payload: &Payload) {
        for (field, value) in payload {
            if is_reserved(field) {
                continue;
            }
            *self.counts.entry(field.clone()).or_insert(0) += 1;
            self.shapes.insert(field.clone(), value.shape());
        }
        self.total_successes += 1;
    }

    /// Fraction of successful payloads that contained `field`, in `[0, 1]`.
    ///
    /// Returns 0.0 when no successes have been recorded; never divides by
    /// zero.
    #[must_use]
    pub fn coverage(&self, field: &str) -> f64 {
        if self.total_successes == 0 {
            return 0.0;
        }
        let count = self.counts.get(field).copied().unwrap_or(0);
        count as f64 / self.total_successes as f64
    }

    /// Occurrence count for `field` (0 if never observed).
    #[must_use]
    pub fn count(&self, field: &str) -> u64 {
        self.counts.get(field).copied().unwrap_or(0)
    }

    /// Most recently observed shape for `field`.
    #[must_use]
    pub fn shape(&self, field: &str) -> Option<FieldShape> {
        self.shapes.get(field).copied()
    }

    /// Every field name ever observed, in lexicographic order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Number of successful payloads recorded so far.
    #[must_use]
    pub const fn total_successes(&self) -> u64 {
        self.total_successes
    }
}

fn is_reserved(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}
