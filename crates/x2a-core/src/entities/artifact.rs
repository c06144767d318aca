use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ArtifactType;

/// A typed output of a job: a plan document, a source bundle reference, or a
/// metadata blob.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    /// A URL, a path, or a serialized payload.
    pub value: String,
}

/// Artifact as reported by a job. The id is optional; the store assigns one
/// when the job does not.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewArtifact {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub value: String,
}
