//! Error types for spec building and cluster calls.

use thiserror::Error;
use x2a_core::enums::MigrationPhase;

/// Errors raised while building Secret and Job specs. Always the caller's
/// fault: the service maps every variant to a 400.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("moduleName is required for {phase} phase")]
    MissingModuleName { phase: MigrationPhase },

    /// Credential shape rejected (missing, both forms, or partial).
    #[error("{0}")]
    Credentials(String),

    #[error("{0}")]
    InvalidInput(String),

    /// The OS random source failed while naming a job or minting a token.
    #[error("random source unavailable: {0}")]
    Random(String),
}

/// Errors from the Kubernetes API.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API server returned a non-success status code.
    #[error("Kubernetes API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse an API response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Client could not be set up from configuration.
    #[error("cluster client configuration: {0}")]
    Config(String),
}

impl ClusterError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
