//! Database error types for x2a-db.

use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., a forbidden status transition).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The single-active-job index rejected a new job.
    #[error("An active job already exists for project {project_id} (module {module_id:?})")]
    ActiveJobExists {
        project_id: String,
        module_id: Option<String>,
    },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
