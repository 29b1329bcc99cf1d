//! Generation adapter: the polymorphic boundary over the two invocation
//! strategies (in-process capability vs. HTTP endpoint).
//!
//! Both strategies produce a [`ProbeOutcome`] from a query string and
//! receive identical census/classifier treatment downstream; nothing else
//! in the harness knows which transport was used. Classification happens
//! here, once, against the first structural cue of the failure — never
//! re-derived later from a formatted message.

use std::collections::BTreeSet;
use std::time::Duration;

use schemaprobe_error::{ProbeError, Result};
use schemaprobe_types::{ErrorCategory, Payload, ProbeOutcome, payload_from_object};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Fixed upper bound on one remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Courtesy delay between consecutive remote calls. Not a correctness
/// requirement; it only keeps the probe from hammering the service.
pub const INTER_CALL_DELAY: Duration = Duration::from_secs(2);

/// Environment variable holding the bearer token for remote mode.
pub const TOKEN_ENV_VAR: &str = "SCHEMAPROBE_TOKEN";

/// Synthetic caller identity passed to the in-process capability.
pub const SYNTHETIC_CALLER_ID: &str = "schemaprobe-harness";

/// Top-level response key holding the generated payload.
const PAYLOAD_KEY: &str = "recipe";

const GENERATE_INTENT: &str = "generate";

/// Opaque fault raised by an in-process generation capability.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GenerationFault(pub String);

impl GenerationFault {
    /// Wrap a fault message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Black-box generation capability invoked in direct mode.
///
/// The harness always passes empty include/exclude constraint sets and the
/// fixed [`SYNTHETIC_CALLER_ID`].
pub trait RecipeGenerator {
    /// Produce a structured payload for a natural-language query.
    fn generate(
        &self,
        query: &str,
        include: &BTreeSet<String>,
        exclude: &BTreeSet<String>,
        caller_id: &str,
    ) -> std::result::Result<Payload, GenerationFault>;
}

/// One invocation strategy. The driver only ever sees this trait.
pub trait GenerationAdapter {
    /// Produce the outcome for one query. Per-query failures are captured
    /// and classified, never propagated.
    fn invoke(&self, query: &str) -> ProbeOutcome;

    /// Courtesy delay the driver applies between consecutive queries.
    fn pacing(&self) -> Option<Duration> {
        None
    }
}

/// In-process strategy over a [`RecipeGenerator`].
#[derive(Debug)]
pub struct DirectAdapter<G> {
    generator: G,
}

impl<G: RecipeGenerator> DirectAdapter<G> {
    /// Wrap an in-process generation capability.
    #[must_use]
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

impl<G: RecipeGenerator> GenerationAdapter for DirectAdapter<G> {
    fn invoke(&self, query: &str) -> ProbeOutcome {
        let include = BTreeSet::new();
        let exclude = BTreeSet::new();
        match self
            .generator
            .generate(query, &include, &exclude, SYNTHETIC_CALLER_ID)
        {
            Ok(payload) => ProbeOutcome::from_payload(payload),
            Err(fault) => ProbeOutcome::failure(ErrorCategory::Transport, fault.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    query: &'a str,
    intent: &'static str,
}

/// Networked strategy: JSON POST to the configured endpoint with a bearer
/// credential.
pub struct RemoteAdapter {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for RemoteAdapter {
    // The token never reaches logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteAdapter")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RemoteAdapter {
    /// Build an adapter for `endpoint` with an explicit token.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ProbeError::InvalidEndpoint {
                url: endpoint.clone(),
                detail: error.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }

    /// Build an adapter with the token taken from [`TOKEN_ENV_VAR`].
    ///
    /// A missing credential is a fatal pre-run configuration error, never a
    /// per-query failure: every subsequent call would fail identically and
    /// a full-batch false failure count would be misleading.
    pub fn from_env(endpoint: impl Into<String>) -> Result<Self> {
        Self::from_env_var(endpoint, TOKEN_ENV_VAR)
    }

    /// Like [`Self::from_env`], reading the token from `var`.
    pub fn from_env_var(endpoint: impl Into<String>, var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Self::new(endpoint, token),
            _ => Err(ProbeError::missing_credential(var)),
        }
    }

    /// The configured endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_response(&self, response: reqwest::blocking::Response) -> ProbeOutcome {
        let status = response.status();
        let body = match response.text() {
            Ok(body) => body,
            Err(error) => {
                return ProbeOutcome::failure(
                    ErrorCategory::Transport,
                    format!("failed to read response body: {error}"),
                );
            }
        };

        if !status.is_success() {
            return ProbeOutcome::failure(
                ErrorCategory::HttpStatus,
                format!("HTTP {}: {body}", status.as_u16()),
            );
        }

        let parsed: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(error) => {
                return ProbeOutcome::failure_with_raw(
                    ErrorCategory::Parse,
                    format!("response body is not valid JSON: {error}"),
                    body,
                );
            }
        };
        let serde_json::Value::Object(mut object) = parsed else {
            return ProbeOutcome::failure_with_raw(
                ErrorCategory::Parse,
                "response body is not a JSON object",
                body,
            );
        };

        match object.remove(PAYLOAD_KEY) {
            Some(serde_json::Value::Object(payload)) => {
                ProbeOutcome::from_payload(payload_from_object(payload))
            }
            _ => ProbeOutcome::failure_with_raw(
                ErrorCategory::MissingKey,
                format!("response has no \"{PAYLOAD_KEY}\" object"),
                body,
            ),
        }
    }
}

impl GenerationAdapter for RemoteAdapter {
    fn invoke(&self, query: &str) -> ProbeOutcome {
        let request = GenerationRequest {
            query,
            intent: GENERATE_INTENT,
        };
        // Serialized explicitly so a construction failure stays
        // distinguishable from a transport failure.
        let body = match serde_json::to_vec(&request) {
            Ok(body) => body,
            Err(error) => {
                return ProbeOutcome::failure(
                    ErrorCategory::RequestConstruction,
                    format!("failed to serialize request body: {error}"),
                );
            }
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.token),
            )
            .body(body)
            .send();

        match response {
            Ok(response) => self.classify_response(response),
            Err(error) => {
                warn!(endpoint = %self.endpoint, error = %error, "generation request failed");
                ProbeOutcome::failure(ErrorCategory::Transport, format!("request failed: {error}"))
            }
        }
    }

    fn pacing(&self) -> Option<Duration> {
        Some(INTER_CALL_DELAY)
    }
}
