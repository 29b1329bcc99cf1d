use serde::{Deserialize, Serialize};

use crate::value::Payload;

/// Failure taxonomy for one probe query.
///
/// Classification happens exactly once, at the generation-adapter boundary,
/// and is never re-derived from a formatted message afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// Request body serialization failed before anything was sent.
    RequestConstruction,
    /// Network/timeout/connection failure, or an in-process generation fault.
    Transport,
    /// The endpoint answered with a non-2xx status.
    HttpStatus,
    /// The response body was not a structured JSON object.
    Parse,
    /// The response parsed but lacked the expected payload key.
    MissingKey,
    /// Generation succeeded but produced zero reportable fields.
    EmptyPayload,
}

impl ErrorCategory {
    /// Stable kebab-case name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestConstruction => "request-construction",
            Self::Transport => "transport",
            Self::HttpStatus => "http-status",
            Self::Parse => "parse",
            Self::MissingKey => "missing-key",
            Self::EmptyPayload => "empty-payload",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one generation attempt: a structured payload or a classified
/// failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Generation produced a non-empty structured payload.
    Success {
        /// The generated payload, field name to value.
        payload: Payload,
    },
    /// Generation failed; the category is fixed at classification time.
    Failure {
        /// Coarse failure bucket.
        category: ErrorCategory,
        /// Human-readable detail for post-mortem inspection.
        message: String,
        /// Unparsed response text, when one was available.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw: Option<String>,
    },
}

impl ProbeOutcome {
    /// Wrap a generated payload, demoting an empty one to a failure.
    ///
    /// A payload with zero fields carries no schema signal, so it is never
    /// a `Success`.
    #[must_use]
    pub fn from_payload(payload: Payload) -> Self {
        if payload.is_empty() {
            Self::Failure {
                category: ErrorCategory::EmptyPayload,
                message: "generation returned a payload with no fields".to_owned(),
                raw: None,
            }
        } else {
            Self::Success { payload }
        }
    }

    /// Construct a failure without raw response text.
    #[must_use]
    pub fn failure(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Failure {
            category,
            message: message.into(),
            raw: None,
        }
    }

    /// Construct a failure that retains the unparsed response body.
    #[must_use]
    pub fn failure_with_raw(
        category: ErrorCategory,
        message: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self::Failure {
            category,
            message: message.into(),
            raw: Some(raw.into()),
        }
    }

    /// Whether this outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The payload, when successful.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// The failure category, when failed.
    #[must_use]
    pub const fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { category, .. } => Some(*category),
        }
    }
}

/// One probe record: the query, its 1-based position in the battery, and the
/// outcome. Position is the addressable identity for reporting; query texts
/// need not be distinct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeEnvelope {
    /// 1-based position in the query battery.
    pub index: usize,
    /// The literal query text.
    pub query: String,
    /// Success payload or classified failure.
    pub outcome: ProbeOutcome,
}

impl ProbeEnvelope {
    /// Build an envelope for the query at `index` (1-based).
    #[must_use]
    pub fn new(index: usize, query: impl Into<String>, outcome: ProbeOutcome) -> Self {
        Self {
            index,
            query: query.into(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::value::FieldValue;

    use super::*;

    #[test]
    fn empty_payload_is_a_failure() {
        let outcome = ProbeOutcome::from_payload(Payload::new());
        assert!(!outcome.is_success());
        assert_eq!(outcome.category(), Some(ErrorCategory::EmptyPayload));
    }

    #[test]
    fn non_empty_payload_is_a_success() {
        let mut payload = Payload::new();
        payload.insert("name".to_owned(), FieldValue::Text("stew".to_owned()));
        let outcome = ProbeOutcome::from_payload(payload.clone());
        assert!(outcome.is_success());
        assert_eq!(outcome.payload(), Some(&payload));
        assert_eq!(outcome.category(), None);
    }

    #[test]
    fn category_names_are_kebab_case() {
        assert_eq!(ErrorCategory::RequestConstruction.as_str(), "request-construction");
        assert_eq!(ErrorCategory::HttpStatus.as_str(), "http-status");
        assert_eq!(ErrorCategory::MissingKey.as_str(), "missing-key");
        assert_eq!(ErrorCategory::EmptyPayload.as_str(), "empty-payload");

        let encoded =
            serde_json::to_string(&ErrorCategory::HttpStatus).expect("category should serialize");
        assert_eq!(encoded, r#""http-status""#);
    }

    #[test]
    fn outcome_serialization_is_tagged_by_status() {
        let failure = ProbeOutcome::failure_with_raw(
            ErrorCategory::Parse,
            "response body was not JSON",
            "<html>oops</html>",
        );
        let encoded = serde_json::to_string(&failure).expect("failure should serialize");
        assert_eq!(
            encoded,
            r#"{"status":"failure","category":"parse","message":"response body was not JSON","raw":"<html>oops</html>"}"#
        );

        let decoded: ProbeOutcome =
            serde_json::from_str(&encoded).expect("failure should parse back");
        assert_eq!(decoded, failure);
    }

    #[test]
    fn failure_without_raw_omits_the_field() {
        let failure = ProbeOutcome::failure(ErrorCategory::Transport, "connection refused");
        let encoded = serde_json::to_string(&failure).expect("failure should serialize");
        assert!(!encoded.contains("raw"));
    }
}
