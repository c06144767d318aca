//! HTTP server configuration.

use serde::{Deserialize, Serialize};

fn default_bind_address() -> String {
    "0.0.0.0:7007".to_string()
}

fn default_api_prefix() -> String {
    "/api/x2a".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Base URL under which jobs inside the cluster reach this service,
    /// e.g. `http://x2a.x2a-system.svc:7007`. Required.
    #[serde(default)]
    pub external_base_url: String,

    /// Path prefix all API routes are mounted under.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            external_base_url: String::new(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl ServerConfig {
    /// External base URL joined with the API prefix, without a trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.external_base_url.trim_end_matches('/'),
            self.api_prefix.trim_matches('/')
        )
    }
}
