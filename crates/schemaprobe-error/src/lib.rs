use thiserror::Error;

/// Fatal-path error type for schemaprobe.
///
/// Per-query failures are never errors: they are captured in result
/// envelopes and classified by the harness. `ProbeError` only covers
/// conditions that must halt a run before or outside the query loop,
/// chiefly missing configuration.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The bearer credential environment variable is unset or empty.
    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential {
        /// Name of the environment variable that must hold the token.
        var: String,
    },

    /// The configured endpoint could not be turned into an HTTP client.
    #[error("invalid endpoint configuration for '{url}': {detail}")]
    InvalidEndpoint {
        /// The endpoint URL as configured.
        url: String,
        /// Underlying client-construction detail.
        detail: String,
    },

    /// File I/O error while persisting a run artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failure.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create a missing-credential error for `var`.
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingCredential { var } => Some(format!(
                "set {var} to a valid bearer token for the generation endpoint"
            )),
            Self::InvalidEndpoint { .. } => {
                Some("check the --endpoint URL and TLS configuration".to_owned())
            }
            Self::Io(_) | Self::Serialize(_) => None,
        }
    }

    /// Process exit code for this error (for CLI use).
    ///
    /// Configuration errors exit 2 so they are distinguishable from
    /// operational failures in scripts.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential { .. } | Self::InvalidEndpoint { .. } => 2,
            Self::Io(_) | Self::Serialize(_) => 1,
        }
    }
}

/// Result type alias using [`ProbeError`].
pub type Result<T> = std::result::Result<T, ProbeError>;
