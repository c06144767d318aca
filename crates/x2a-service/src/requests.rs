//! Request bodies accepted by the orchestration operations.

use serde::{Deserialize, Serialize};
use x2a_core::entities::NewArtifact;
use x2a_core::enums::{JobStatus, MigrationPhase};
use x2a_k8s::credentials::{AapCredentials, RepoAuth};

/// Body of a run submission. `phase` is required for module runs and must
/// be `init` or absent for project runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub phase: Option<MigrationPhase>,
    #[serde(default)]
    pub source_repo_auth: Option<RepoAuth>,
    #[serde(default)]
    pub target_repo_auth: Option<RepoAuth>,
    #[serde(default)]
    pub aap_credentials: Option<AapCredentials>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Body a job POSTs when it finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectArtifactsRequest {
    pub status: JobStatus,
    #[serde(default)]
    pub error_details: Option<String>,
    pub job_id: String,
    #[serde(default)]
    pub artifacts: Vec<NewArtifact>,
    #[serde(default)]
    pub telemetry: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleRequest {
    pub name: String,
    pub source_path: String,
}
