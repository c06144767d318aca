//! Request-level error taxonomy.

use thiserror::Error;
use x2a_core::enums::MigrationPhase;
use x2a_db::error::DatabaseError;
use x2a_k8s::{ClusterError, SpecError};

/// Every failure an orchestration operation can report.
///
/// `NotFound` also covers rows that exist but are outside the caller's scope.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    NotFound(String),

    /// A pending or running job already occupies the project or module.
    #[error("job {active_job_id} ({active_job_phase}) is already running")]
    Conflict {
        active_job_id: String,
        active_job_phase: MigrationPhase,
    },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotAllowed(String),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl OrchestrationError {
    pub(crate) fn project_not_found(project_id: &str) -> Self {
        Self::NotFound(format!("project {project_id} not found"))
    }

    pub(crate) fn module_not_found(module_id: &str) -> Self {
        Self::NotFound(format!("module {module_id} not found"))
    }
}
