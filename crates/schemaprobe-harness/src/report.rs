//! Immutable run report: counts, coverage, critical fields, one sample, and
//! the full envelope list.
//!
//! The builder performs no I/O. `render_summary` produces the deterministic
//! console text; serialization of the whole report is the caller's concern.
//! Field tables are keyed by `BTreeMap`, so output never depends on hash
//! iteration order.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use schemaprobe_types::{ErrorCategory, FieldShape, FieldValue, Payload, ProbeEnvelope};
use serde::{Deserialize, Serialize};

use crate::census::FieldCensus;
use crate::classify::ErrorClassifier;

/// Text longer than this is truncated in the sample rendering.
const SAMPLE_TEXT_LIMIT: usize = 50;

/// Display status for a critical field. A display aid, never a pass/fail
/// gate: the harness does not fail its exit status on these thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalStatus {
    /// Present in every successful payload (coverage == 1.0).
    Ok,
    /// Present in at least half of them (0.5 <= coverage < 1.0).
    Warn,
    /// Present in fewer than half (coverage < 0.5).
    Missing,
}

impl CriticalStatus {
    /// Classify a coverage fraction. Boundaries are inclusive as stated:
    /// exactly 1.0 is `Ok`, exactly 0.5 is `Warn`.
    #[must_use]
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage >= 1.0 {
            Self::Ok
        } else if coverage >= 0.5 {
            Self::Warn
        } else {
            Self::Missing
        }
    }

    /// Stable lowercase marker used in the console table.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Missing => "missing",
        }
    }
}

/// Coverage entry for one caller-supplied critical field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalField {
    /// The field name, as supplied by the caller.
    pub field: String,
    /// Coverage fraction in `[0, 1]`; 0 for names never observed.
    pub coverage: f64,
    /// Display status derived from the coverage.
    pub status: CriticalStatus,
}

/// The terminal artifact of a run. Built once from the accumulated census,
/// classifier tallies, and envelope list; never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Number of queries processed.
    pub total: usize,
    /// Number of successful generations.
    pub successes: usize,
    /// Number of classified failures.
    pub failures: usize,
    /// Coverage fraction per observed field, lexicographic.
    pub field_coverage: BTreeMap<String, f64>,
    /// Occurrence count per observed field.
    pub field_counts: BTreeMap<String, u64>,
    /// Most recently observed shape per field.
    pub field_shapes: BTreeMap<String, FieldShape>,
    /// Failure tallies keyed by category.
    pub error_tallies: BTreeMap<ErrorCategory, u64>,
    /// Critical-field coverage, in caller-supplied order.
    pub critical_coverage: Vec<CriticalField>,
    /// Payload of the first successful envelope, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<Payload>,
    /// The full ordered envelope list, for post-mortem inspection.
    pub envelopes: Vec<ProbeEnvelope>,
}

impl RunReport {
    /// Combine the accumulated state into the final report.
    ///
    /// `critical_fields` may contain names never observed; their coverage
    /// is 0 and their status `Missing`.
    #[must_use]
    pub fn build(
        envelopes: Vec<ProbeEnvelope>,
        census: &FieldCensus,
        classifier: &ErrorClassifier,
        critical_fields: &[String],
    ) -> Self {
        let total = envelopes.len();
        let successes = envelopes
            .iter()
            .filter(|envelope| envelope.outcome.is_success())
            .count();

        let mut field_coverage = BTreeMap::new();
        let mut field_counts = BTreeMap::new();
        let mut field_shapes = BTreeMap::new();
        for field in census.fields() {
            field_coverage.insert(field.to_owned(), census.coverage(field));
            field_counts.insert(field.to_owned(), census.count(field));
            if let Some(shape) = census.shape(field) {
                field_shapes.insert(field.to_owned(), shape);
            }
        }

        let critical_coverage = critical_fields
            .iter()
            .map(|field| {
                let coverage = census.coverage(field);
                CriticalField {
                    field: field.clone(),
                    coverage,
                    status: CriticalStatus::from_coverage(coverage),
                }
            })
            .collect();

        let sample = envelopes
            .iter()
            .find_map(|envelope| envelope.outcome.payload())
            .cloned();

        Self {
            total,
            successes,
            failures: total - successes,
            field_coverage,
            field_counts,
            field_shapes,
            error_tallies: classifier.tallies().clone(),
            critical_coverage,
            sample,
            envelopes,
        }
    }

    /// Success rate in `[0, 1]`; 0 for an empty run.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successes as f64 / self.total as f64
    }

    /// Render the deterministic console summary.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Consistency Report");
        let _ = writeln!(out);
        let _ = writeln!(out, "- total: {}", self.total);
        let _ = writeln!(
            out,
            "- successes: {} ({:.1}%)",
            self.successes,
            self.success_rate() * 100.0
        );
        let _ = writeln!(out, "- failures: {}", self.failures);

        if !self.field_coverage.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "## Field Coverage (over {} successful payloads)",
                self.successes
            );
            let _ = writeln!(out);
            for (field, coverage) in &self.field_coverage {
                let count = self.field_counts.get(field).copied().unwrap_or(0);
                let shape = self
                    .field_shapes
                    .get(field)
                    .map_or_else(String::new, |shape| format!("  {shape}"));
                let _ = writeln!(
                    out,
                    "  {field:<15} {count:>2}/{:<2} ({:>5.1}%){shape}",
                    self.successes,
                    coverage * 100.0
                );
            }
        }

        if !self.critical_coverage.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Critical Fields");
            let _ = writeln!(out);
            for critical in &self.critical_coverage {
                let marker = format!("[{}]", critical.status.marker());
                let _ = writeln!(
                    out,
                    "  {marker:<9} {:<15} ({:>5.1}%)",
                    critical.field,
                    critical.coverage * 100.0
                );
            }
        }

        if !self.error_tallies.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Error Breakdown");
            let _ = writeln!(out);
            for (category, count) in &self.error_tallies {
                let _ = writeln!(out, "  {:<22} {count}", category.as_str());
            }
        }

        if let Some(sample) = &self.sample {
            let _ = writeln!(out);
            match self.sample_origin() {
                Some(envelope) => {
                    let _ = writeln!(
                        out,
                        "## Sample Payload (query {}: \"{}\")",
                        envelope.index, envelope.query
                    );
                }
                None => {
                    let _ = writeln!(out, "## Sample Payload");
                }
            }
            let _ = writeln!(out);
            for (field, value) in sample {
                render_sample_field(&mut out, field, value);
            }
        }

        out
    }

    /// The envelope the sample payload came from (first success).
    fn sample_origin(&self) -> Option<&ProbeEnvelope> {
        self.envelopes
            .iter()
            .find(|envelope| envelope.outcome.is_success())
    }
}

fn render_sample_field(out: &mut String, field: &str, value: &FieldValue) {
    match value {
        FieldValue::Sequence(items) => {
            let _ = writeln!(out, "  {field:<15} [sequence with {} items]", items.len());
            if let Some(first) = items.first() {
                let _ = writeln!(out, "  {:<15} example: {}", "", render_scalar(first));
            }
        }
        FieldValue::Mapping(entries) => {
            let _ = writeln!(out, "  {field:<15} [mapping with {} fields]", entries.len());
        }
        scalar => {
            let _ = writeln!(out, "  {field:<15} {}", render_scalar(scalar));
        }
    }
}

fn render_scalar(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "null".to_owned(),
        FieldValue::Bool(flag) => flag.to_string(),
        FieldValue::Number(number) => number.to_string(),
        FieldValue::Text(text) => format!("\"{}\"", truncate_text(text, SAMPLE_TEXT_LIMIT)),
        FieldValue::Sequence(items) => format!("[sequence with {} items]", items.len()),
        FieldValue::Mapping(entries) => format!("[mapping with {} fields]", entries.len()),
    }
}

/// Truncate on a character boundary, leaving room for the ellipsis.
fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }
    let head: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use schemaprobe_types::ProbeOutcome;

    use super::*;

    fn payload_of(fields: &[(&str, FieldValue)]) -> Payload {
        fields
            .iter()
            .map(|(field, value)| ((*field).to_owned(), value.clone()))
            .collect()
    }

    fn recipe_payload() -> Payload {
        payload_of(&[
            ("name", FieldValue::Text("X".to_owned())),
            (
                "ingredients",
                FieldValue::Sequence(vec![
                    FieldValue::Text("a".to_owned()),
                    FieldValue::Text("b".to_owned()),
                ]),
            ),
        ])
    }

    fn critical(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn status_boundaries_are_exact() {
        assert_eq!(CriticalStatus::from_coverage(1.0), CriticalStatus::Ok);
        assert_eq!(CriticalStatus::from_coverage(0.999), CriticalStatus::Warn);
        assert_eq!(CriticalStatus::from_coverage(0.5), CriticalStatus::Warn);
        assert_eq!(CriticalStatus::from_coverage(0.499), CriticalStatus::Missing);
        assert_eq!(CriticalStatus::from_coverage(0.0), CriticalStatus::Missing);
    }

    #[test]
    fn build_counts_and_coverage_for_uniform_batch() {
        let mut census = FieldCensus::new();
        let classifier = ErrorClassifier::new();
        let mut envelopes = Vec::new();
        for index in 1..=3 {
            let payload = recipe_payload();
            census.record(&payload);
            envelopes.push(ProbeEnvelope::new(
                index,
                format!("query {index}"),
                ProbeOutcome::from_payload(payload),
            ));
        }

        let report = RunReport::build(
            envelopes,
            &census,
            &classifier,
            &critical(&["name", "description"]),
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.successes, 3);
        assert_eq!(report.failures, 0);
        assert_eq!(report.field_coverage.get("name"), Some(&1.0));
        assert_eq!(report.field_coverage.get("ingredients"), Some(&1.0));
        assert_eq!(report.field_coverage.len(), 2);

        assert_eq!(report.critical_coverage.len(), 2);
        assert_eq!(report.critical_coverage[0].field, "name");
        assert_eq!(report.critical_coverage[0].coverage, 1.0);
        assert_eq!(report.critical_coverage[0].status, CriticalStatus::Ok);
        assert_eq!(report.critical_coverage[1].field, "description");
        assert_eq!(report.critical_coverage[1].coverage, 0.0);
        assert_eq!(report.critical_coverage[1].status, CriticalStatus::Missing);
    }

    #[test]
    fn sample_is_first_success_in_original_order() {
        let mut census = FieldCensus::new();
        let mut classifier = ErrorClassifier::new();

        let failure = ProbeOutcome::failure(ErrorCategory::Transport, "connection refused");
        classifier.record(ErrorCategory::Transport);

        let first_payload = payload_of(&[("name", FieldValue::Text("first".to_owned()))]);
        let second_payload = payload_of(&[("name", FieldValue::Text("second".to_owned()))]);
        census.record(&first_payload);
        census.record(&second_payload);

        let envelopes = vec![
            ProbeEnvelope::new(1, "a", failure),
            ProbeEnvelope::new(2, "b", ProbeOutcome::from_payload(first_payload.clone())),
            ProbeEnvelope::new(3, "c", ProbeOutcome::from_payload(second_payload)),
        ];

        let report = RunReport::build(envelopes, &census, &classifier, &[]);
        assert_eq!(report.sample.as_ref(), Some(&first_payload));
        assert_eq!(report.sample_origin().map(|envelope| envelope.index), Some(2));
        assert_eq!(report.error_tallies.get(&ErrorCategory::Transport), Some(&1));
    }

    #[test]
    fn empty_run_produces_an_empty_report() {
        let report = RunReport::build(
            Vec::new(),
            &FieldCensus::new(),
            &ErrorClassifier::new(),
            &critical(&["name"]),
        );
        assert_eq!(report.total, 0);
        assert_eq!(report.success_rate(), 0.0);
        assert_eq!(report.sample, None);
        assert_eq!(report.critical_coverage[0].coverage, 0.0);
        // Renders without panicking even with nothing observed.
        let summary = report.render_summary();
        assert!(summary.contains("- total: 0"));
    }

    #[test]
    fn render_summary_is_deterministic_and_complete() {
        let mut census = FieldCensus::new();
        let mut classifier = ErrorClassifier::new();
        classifier.record(ErrorCategory::HttpStatus);

        let payload = recipe_payload();
        census.record(&payload);
        let envelopes = vec![
            ProbeEnvelope::new(
                1,
                "spicy pasta with vegetables",
                ProbeOutcome::from_payload(payload),
            ),
            ProbeEnvelope::new(
                2,
                "chocolate chip cookies",
                ProbeOutcome::failure(ErrorCategory::HttpStatus, "HTTP 500: boom"),
            ),
        ];

        let report = RunReport::build(envelopes, &census, &classifier, &critical(&["name"]));
        let summary = report.render_summary();
        assert_eq!(summary, report.render_summary());

        assert!(summary.contains("- successes: 1 (50.0%)"));
        assert!(summary.contains("## Field Coverage (over 1 successful payloads)"));
        assert!(summary.contains("ingredients"));
        assert!(summary.contains("[ok]"));
        assert!(summary.contains("http-status"));
        assert!(summary.contains("## Sample Payload (query 1: \"spicy pasta with vegetables\")"));
        assert!(summary.contains("[sequence with 2 items]"));
        assert!(summary.contains("example: \"a\""));
    }

    #[test]
    fn long_text_is_truncated_in_sample_rendering() {
        let long = "x".repeat(80);
        let rendered = render_scalar(&FieldValue::Text(long));
        assert_eq!(rendered.len(), 47 + 3 + 2);
        assert!(rendered.ends_with("...\""));
    }
}
