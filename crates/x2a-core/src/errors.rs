//! Cross-cutting error types for x2a.
//!
//! Domain-specific errors (`DatabaseError`, `ClusterError`, `SpecError`) live in
//! their respective crates. `OrchestrationError` in `x2a-service` is where they
//! converge into the request-level taxonomy.

use thiserror::Error;

/// Errors that can be raised by any x2a crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
