//! LLM provider configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Model identifier passed to the migration tool.
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default)]
    pub bearer_token: String,

    /// Opaque key/value pairs copied verbatim into the project Secret.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}
