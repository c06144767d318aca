//! Composition root: configuration loading and wiring of the concrete
//! store, cluster client, and identity provider.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use figment::providers::{Env, Format, Toml};
use x2a_config::{ConfigError, X2aConfig};
use x2a_db::service::MigrationStore;
use x2a_k8s::builder::ResourceSpecBuilder;
use x2a_k8s::client::KubeClient;
use x2a_service::{Orchestrator, OrchestratorSettings};

use crate::identity::{ConfiguredPermissions, HeaderIdentity};
use crate::state::AppState;

/// Load `.env`, then the layered configuration, with `explicit` merged
/// above `./x2a.toml` and below the environment.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<X2aConfig> {
    dotenvy::dotenv().ok();

    let mut figment = X2aConfig::figment();
    if let Some(path) = explicit {
        anyhow::ensure!(path.exists(), "config file {} does not exist", path.display());
        figment = figment
            .merge(Toml::file(path))
            .merge(Env::prefixed("X2A_").split("__"));
    }
    figment
        .extract::<X2aConfig>()
        .map_err(ConfigError::from)
        .context("failed to load x2a configuration")
}

/// Wire the application state from a validated configuration.
pub async fn compose(config: &X2aConfig) -> anyhow::Result<Arc<AppState>> {
    config.validate().context("invalid x2a configuration")?;

    let store = MigrationStore::open_local(&config.database.path)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;
    let cluster = KubeClient::from_config(&config.kubernetes)
        .context("failed to build Kubernetes client")?;
    let builder = ResourceSpecBuilder::new(config.kubernetes.clone(), config.server.api_base_url());
    let settings = OrchestratorSettings {
        llm: config.llm.clone(),
        aap: config.aap.clone(),
        require_callback_token: config.auth.require_callback_token,
    };
    if !settings.require_callback_token {
        tracing::warn!("callback token verification is disabled");
    }

    let permissions = Arc::new(ConfiguredPermissions::from_config(&config.auth));
    Ok(Arc::new(AppState {
        orchestrator: Orchestrator::new(Arc::new(store), Arc::new(cluster), builder, settings),
        identity: HeaderIdentity::new(config.auth.user_header.clone(), permissions),
    }))
}

/// Render the configuration for `check-config`, credentials masked.
pub fn render_redacted(config: &X2aConfig) -> anyhow::Result<String> {
    toml::to_string_pretty(&config.redacted()).context("failed to render configuration")
}
