//! # x2a-config
//!
//! Layered configuration loading for x2a using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`X2A_*` prefix, `__` as separator)
//! 2. Project-level `./x2a.toml`
//! 3. User-level `~/.config/x2a/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `X2A_KUBERNETES__NAMESPACE` -> `kubernetes.namespace`,
//! `X2A_AAP__OAUTH_TOKEN` -> `aap.oauth_token`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use x2a_config::X2aConfig;
//!
//! let config = X2aConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//! println!("namespace: {}", config.kubernetes.namespace);
//! ```

mod aap;
mod auth;
mod database;
mod error;
mod kubernetes;
mod llm;
mod server;

pub use aap::AapConfig;
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use kubernetes::{KubernetesConfig, ResourceRequirementsConfig};
pub use llm::LlmConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct X2aConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub aap: AapConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl X2aConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the current directory.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the binary can layer an explicit file on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from("x2a.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("X2A_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("x2a").join("config.toml"))
    }

    /// Check the fields the service cannot start without.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` for a missing required field and
    /// `ConfigError::InvalidValue` for a malformed one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("kubernetes.namespace", &self.kubernetes.namespace),
            ("kubernetes.image", &self.kubernetes.image),
            ("server.external_base_url", &self.server.external_base_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::NotConfigured {
                    field: field.to_string(),
                });
            }
        }

        let base = &self.server.external_base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "server.external_base_url".to_string(),
                reason: format!("'{base}' is not an http(s) URL"),
            });
        }
        if self.kubernetes.command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "kubernetes.command".to_string(),
                reason: "must contain at least the executable".to_string(),
            });
        }
        if self.kubernetes.ttl_seconds_after_finished < 0 {
            return Err(ConfigError::InvalidValue {
                field: "kubernetes.ttl_seconds_after_finished".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Copy with every credential replaced, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        fn mask(value: &mut String) {
            if !value.is_empty() {
                *value = REDACTED.to_string();
            }
        }

        let mut copy = self.clone();
        mask(&mut copy.kubernetes.token);
        mask(&mut copy.llm.access_key_id);
        mask(&mut copy.llm.secret_access_key);
        mask(&mut copy.llm.bearer_token);
        copy.llm.extra.values_mut().for_each(mask);
        mask(&mut copy.aap.oauth_token);
        mask(&mut copy.aap.password);
        copy
    }
}
