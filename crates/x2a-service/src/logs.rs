//! Log retrieval for the latest job of a phase.

use x2a_core::enums::MigrationPhase;
use x2a_core::identity::CallerIdentity;
use x2a_db::repos::job::JobFilter;
use x2a_k8s::gateway::LogStream;

use crate::error::OrchestrationError;
use crate::orchestrator::Orchestrator;

/// Log body: buffered text, or a live stream that follows the pod.
pub enum LogOutput {
    Text(String),
    Stream(LogStream),
}

impl std::fmt::Debug for LogOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl Orchestrator {
    /// Logs of the latest job of `phase` for a project (`init`) or module.
    ///
    /// Active jobs are reconciled first. Terminal jobs answer from the
    /// stored log, active ones from the cluster, and a job that has no
    /// cluster Job yet yields an empty body.
    ///
    /// # Errors
    ///
    /// `Input` when `module_id` does not fit the phase, `NotFound` when the
    /// project, module, or job is absent, `Cluster` when reading live logs
    /// fails.
    pub async fn job_log(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        module_id: Option<&str>,
        phase: MigrationPhase,
        streaming: bool,
    ) -> Result<LogOutput, OrchestrationError> {
        self.project_in_scope(project_id, &caller.read_scope()).await?;

        let mut filter = JobFilter::for_project(project_id).phase(phase).last_job_only();
        match (phase.is_module_phase(), module_id) {
            (true, Some(module_id)) => {
                self.module_of(project_id, module_id).await?;
                filter = filter.module(module_id);
            }
            (true, None) => {
                return Err(OrchestrationError::Input(format!(
                    "moduleId is required for {phase} phase"
                )));
            }
            (false, Some(_)) => {
                return Err(OrchestrationError::Input(
                    "moduleId must not be provided for init phase".to_string(),
                ));
            }
            (false, None) => {}
        }

        let job = self
            .store()
            .list_jobs(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrchestrationError::NotFound(format!("no {phase} job found")))?;
        let job = self.reconcile_job(job).await?;

        if job.status.is_terminal() {
            let log = self.store().job_log(&job.id).await?.unwrap_or_default();
            return Ok(LogOutput::Text(log));
        }
        let Some(k8s_job_name) = job.k8s_job_name.as_deref() else {
            return Ok(LogOutput::Text(String::new()));
        };
        if streaming {
            Ok(LogOutput::Stream(self.cluster().stream_job_logs(k8s_job_name).await?))
        } else {
            Ok(LogOutput::Text(self.cluster().job_logs(k8s_job_name).await?))
        }
    }
}
