use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A sub-unit of a project (e.g. one cookbook) that goes through
/// analyze/migrate/publish independently.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub name: String,
    pub source_path: String,
    pub project_id: String,
}

/// One entry of the `project_metadata` artifact produced by `init`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ModuleMetadataEntry {
    pub name: String,
    pub path: String,
}
