use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Artifact;
use crate::enums::{JobStatus, MigrationPhase};

/// One execution record of a phase, backed by one Kubernetes Job once
/// submitted.
///
/// This is the projection returned across the service boundary: the callback
/// token and the (potentially large) log are never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub project_id: String,
    /// `None` for `init` jobs.
    pub module_id: Option<String>,
    pub phase: MigrationPhase,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Set once the cluster resource exists.
    pub k8s_job_name: Option<String>,
    pub error_details: Option<String>,
    /// Optional structured agent metrics reported by the job.
    pub telemetry: Option<serde_json::Value>,
    pub artifacts: Vec<Artifact>,
}

