use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The top-level migration unit: one source repository converted into one
/// target repository.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Short name used for directory names inside the target repository.
    pub abbreviation: String,
    pub description: String,
    pub source_repo_url: String,
    pub source_repo_branch: String,
    pub target_repo_url: String,
    pub target_repo_branch: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies when registering a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub abbreviation: String,
    #[serde(default)]
    pub description: String,
    pub source_repo_url: String,
    pub source_repo_branch: String,
    pub target_repo_url: String,
    pub target_repo_branch: String,
}
