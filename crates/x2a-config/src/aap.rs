//! Ansible Automation Platform configuration.

use serde::{Deserialize, Serialize};

/// System-wide AAP settings. Credentials here are the fallback when a run
/// request carries none of its own.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AapConfig {
    #[serde(default)]
    pub controller_url: String,

    #[serde(default)]
    pub org_name: String,

    #[serde(default)]
    pub oauth_token: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl AapConfig {
    /// Whether any credential field is set.
    pub fn has_credentials(&self) -> bool {
        !self.oauth_token.is_empty() || !self.username.is_empty() || !self.password.is_empty()
    }
}
