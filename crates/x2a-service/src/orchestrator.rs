//! The orchestration service and the lookups its operations share.
//!
//! Operations are spread across modules as `impl Orchestrator` blocks:
//! [`crate::projects`], [`crate::modules`], [`crate::run`],
//! [`crate::reconcile`], [`crate::callback`], and [`crate::logs`].

use std::sync::Arc;

use x2a_config::{AapConfig, LlmConfig};
use x2a_core::entities::{Module, Project};
use x2a_core::identity::AccessScope;
use x2a_db::service::MigrationStore;
use x2a_k8s::builder::{ResourceSpecBuilder, job_secret_name};
use x2a_k8s::gateway::ClusterApi;

use crate::error::OrchestrationError;

/// Settings the orchestrator reads on every run.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    pub llm: LlmConfig,
    pub aap: AapConfig,
    /// Reject callbacks that do not present the job's callback token.
    pub require_callback_token: bool,
}

/// Coordinates the store, the spec builder, and the cluster.
pub struct Orchestrator {
    store: Arc<MigrationStore>,
    cluster: Arc<dyn ClusterApi>,
    builder: ResourceSpecBuilder,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<MigrationStore>,
        cluster: Arc<dyn ClusterApi>,
        builder: ResourceSpecBuilder,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            cluster,
            builder,
            settings,
        }
    }

    pub(crate) fn store(&self) -> &MigrationStore {
        &self.store
    }

    pub(crate) fn cluster(&self) -> &dyn ClusterApi {
        self.cluster.as_ref()
    }

    pub(crate) const fn builder(&self) -> &ResourceSpecBuilder {
        &self.builder
    }

    pub(crate) const fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Load a project visible within `scope`.
    pub(crate) async fn project_in_scope(
        &self,
        project_id: &str,
        scope: &AccessScope,
    ) -> Result<Project, OrchestrationError> {
        self.store
            .get_project(project_id, scope)
            .await?
            .ok_or_else(|| OrchestrationError::project_not_found(project_id))
    }

    pub(crate) async fn module_of(
        &self,
        project_id: &str,
        module_id: &str,
    ) -> Result<Module, OrchestrationError> {
        self.store
            .get_module(project_id, module_id)
            .await?
            .ok_or_else(|| OrchestrationError::module_not_found(module_id))
    }

    /// Delete a job's git credentials Secret, logging instead of failing.
    pub(crate) async fn discard_job_secret(&self, job_id: &str) {
        let name = job_secret_name(job_id);
        if let Err(e) = self.cluster.delete_secret(&name).await {
            tracing::warn!(job_id, secret = %name, error = %e, "failed to delete job secret");
        }
    }
}
