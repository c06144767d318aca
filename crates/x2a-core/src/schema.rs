//! JSON Schemas of the API payload types, by name.

use schemars::schema_for;

use crate::entities::{Artifact, Job, Module, NewArtifact, NewProject, Project};
use crate::errors::CoreError;
use crate::responses::{CollectArtifactsResponse, ModuleView, ProjectView, RunResponse};

/// Every name [`api_schema`] answers for, sorted.
pub const SCHEMA_NAMES: &[&str] = &[
    "artifact",
    "collect_artifacts_response",
    "job",
    "module",
    "module_view",
    "new_artifact",
    "new_project",
    "project",
    "project_view",
    "run_response",
];

/// JSON Schema of a named API type, `None` for an unknown name.
///
/// # Errors
///
/// Returns `CoreError::Other` if the generated schema cannot be serialized.
pub fn api_schema(name: &str) -> Result<Option<serde_json::Value>, CoreError> {
    let schema = match name {
        "artifact" => schema_for!(Artifact),
        "collect_artifacts_response" => schema_for!(CollectArtifactsResponse),
        "job" => schema_for!(Job),
        "module" => schema_for!(Module),
        "module_view" => schema_for!(ModuleView),
        "new_artifact" => schema_for!(NewArtifact),
        "new_project" => schema_for!(NewProject),
        "project" => schema_for!(Project),
        "project_view" => schema_for!(ProjectView),
        "run_response" => schema_for!(RunResponse),
        _ => return Ok(None),
    };
    serde_json::to_value(schema)
        .map(Some)
        .map_err(|e| CoreError::Other(e.into()))
}
