//! Run driver: strictly sequential orchestration of a query battery.
//!
//! Queries are processed in input order — no reordering, no parallelism;
//! order is a reporting and reproducibility guarantee. A single query's
//! failure never aborts the run. The accumulators are owned exclusively by
//! the driver and mutated only from the single execution path, so no
//! locking exists anywhere in the engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use schemaprobe_types::{ProbeEnvelope, ProbeOutcome};
use tracing::{debug, info};

use crate::adapter::GenerationAdapter;
use crate::census::FieldCensus;
use crate::classify::ErrorClassifier;
use crate::report::RunReport;

/// Lifecycle of a run. `run` moves through every state in order; the
/// consuming signature makes re-entry impossible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Queries and adapter are configured; no calls made yet.
    Idle,
    /// Iterating the battery.
    Running,
    /// Building the report.
    Reporting,
    /// Terminal; report handed to the caller.
    Done,
}

/// Sequences queries through a [`GenerationAdapter`], routes each outcome
/// into the census or the classifier, retains every envelope, and builds
/// the report exactly once.
pub struct RunDriver<A> {
    adapter: A,
    queries: Vec<String>,
    critical_fields: Vec<String>,
    cancel: Option<Arc<AtomicBool>>,
    state: DriverState,
}

impl<A: GenerationAdapter> RunDriver<A> {
    /// Configure a driver. No calls are made until [`Self::run`].
    #[must_use]
    pub fn new(adapter: A, queries: Vec<String>, critical_fields: Vec<String>) -> Self {
        Self {
            adapter,
            queries,
            critical_fields,
            cancel: None,
            state: DriverState::Idle,
        }
    }

    /// Install a cooperative cancellation flag, checked between queries.
    ///
    /// A raised flag skips the remaining queries; the envelopes gathered so
    /// far still produce a report.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Process the whole battery and build the report.
    ///
    /// The only fatal error path (missing credential) happens at adapter
    /// construction, before a driver exists; from here on every failure is
    /// captured in an envelope.
    pub fn run(mut self) -> RunReport {
        self.state = DriverState::Running;
        let total = self.queries.len();
        info!(total, "starting consistency run");

        let mut census = FieldCensus::new();
        let mut classifier = ErrorClassifier::new();
        let mut envelopes = Vec::with_capacity(total);

        for (position, query) in self.queries.iter().enumerate() {
            if self.cancelled() {
                info!(
                    processed = envelopes.len(),
                    total, "run cancelled; reporting partial results"
                );
                break;
            }
            if position > 0 {
                if let Some(delay) = self.adapter.pacing() {
                    thread::sleep(delay);
                }
            }

            let index = position + 1;
            info!(index, total, query = %query, "issuing query");
            let outcome = self.adapter.invoke(query);
            match &outcome {
                ProbeOutcome::Success { payload } => census.record(payload),
                ProbeOutcome::Failure {
                    category, message, ..
                } => {
                    debug!(index, category = %category, message = %message, "query failed");
                    classifier.record(*category);
                }
            }
            envelopes.push(ProbeEnvelope::new(index, query.clone(), outcome));
        }

        self.state = DriverState::Reporting;
        let report = RunReport::build(envelopes, &census, &classifier, &self.critical_fields);
        self.state = DriverState::Done;
        info!(
            total = report.total,
            successes = report.successes,
            failures = report.failures,
            "run complete"
        );
        report
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
