//! Completion reports posted by in-cluster jobs.
//!
//! The callback is the single writer that moves a job to its terminal state
//! with artifacts and telemetry. Validation runs before anything is written:
//!
//! ```text
//! jobId format → terminal status → moduleId presence vs phase
//!   → unique artifact ids → job exists in project → callback token
//!   → phase / moduleId match → job not yet finished
//! ```
//!
//! The job update, its artifacts and any module sync commit in one store
//! transaction.

use std::collections::HashSet;

use x2a_core::enums::{ArtifactType, JobStatus, MigrationPhase};
use x2a_core::ids::{PREFIX_JOB, is_valid_id};
use x2a_core::responses::CollectArtifactsResponse;
use x2a_db::error::DatabaseError;
use x2a_db::updates::job::JobUpdateBuilder;

use crate::error::OrchestrationError;
use crate::modules::ModuleSyncPlan;
use crate::orchestrator::Orchestrator;
use crate::requests::CollectArtifactsRequest;

/// Where the callback says it comes from: the query parameters of the
/// callback URL plus the bearer token, if any.
#[derive(Debug, Clone, Copy)]
pub struct CallbackOrigin<'a> {
    pub project_id: &'a str,
    pub phase: MigrationPhase,
    pub module_id: Option<&'a str>,
    pub bearer_token: Option<&'a str>,
}

fn input(message: impl Into<String>) -> OrchestrationError {
    OrchestrationError::Input(message.into())
}

impl Orchestrator {
    /// Record a job's final status, artifacts, telemetry, and logs.
    ///
    /// # Errors
    ///
    /// `Input` for malformed or contradictory reports, `NotFound` when the
    /// job does not belong to the project, `Unauthenticated` for a missing
    /// or wrong callback token, `Database` when persisting fails.
    pub async fn collect_artifacts(
        &self,
        origin: CallbackOrigin<'_>,
        request: CollectArtifactsRequest,
    ) -> Result<CollectArtifactsResponse, OrchestrationError> {
        if !is_valid_id(PREFIX_JOB, &request.job_id) {
            return Err(input(format!("invalid jobId '{}'", request.job_id)));
        }
        if !request.status.is_terminal() {
            return Err(input(format!(
                "status must be success or error, got '{}'",
                request.status
            )));
        }
        let module_id = origin.module_id.filter(|m| !m.is_empty());
        match (origin.phase, module_id) {
            (MigrationPhase::Init, Some(_)) => {
                return Err(input("moduleId must not be provided for init phase"));
            }
            (phase, None) if phase.is_module_phase() => {
                return Err(input(format!("moduleId is required for {phase} phase")));
            }
            _ => {}
        }
        let mut seen = HashSet::new();
        for id in request.artifacts.iter().filter_map(|a| a.id.as_deref()) {
            if !id.is_empty() && !seen.insert(id) {
                return Err(input(format!("duplicate artifact id '{id}'")));
            }
        }

        let job = self
            .store()
            .get_job(&request.job_id)
            .await?
            .filter(|job| job.project_id == origin.project_id)
            .ok_or_else(|| {
                OrchestrationError::NotFound(format!(
                    "job {} not found in project {}",
                    request.job_id, origin.project_id
                ))
            })?;

        if self.settings().require_callback_token {
            let presented = origin.bearer_token.unwrap_or_default();
            if presented.is_empty()
                || !self
                    .store()
                    .verify_callback_token(&job.id, presented)
                    .await?
            {
                tracing::warn!(job_id = %job.id, "callback rejected, bad token");
                return Err(OrchestrationError::Unauthenticated(
                    "invalid or missing callback token".to_string(),
                ));
            }
        }

        if job.phase != origin.phase {
            return Err(input(format!(
                "phase mismatch: job {} is {}, callback reported {}",
                job.id, job.phase, origin.phase
            )));
        }
        if job.module_id.as_deref() != module_id {
            return Err(input(format!(
                "moduleId mismatch: job {} belongs to {}",
                job.id,
                job.module_id.as_deref().unwrap_or("no module")
            )));
        }

        if job.status.is_terminal() {
            return Err(input(format!(
                "job {} already finished with status {}",
                job.id, job.status
            )));
        }

        let log = match job.k8s_job_name.as_deref() {
            Some(name) => match self.cluster().job_logs(name).await {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!(job_id = %job.id, error = %e, "failed to fetch job logs");
                    None
                }
            },
            None => None,
        };

        let sync = match request
            .artifacts
            .iter()
            .find(|a| a.artifact_type == ArtifactType::ProjectMetadata)
        {
            Some(metadata)
                if job.phase == MigrationPhase::Init && request.status == JobStatus::Success =>
            {
                self.plan_sync_from_metadata(&job.project_id, &metadata.value)
                    .await?
            }
            _ => ModuleSyncPlan::default(),
        };

        let update = JobUpdateBuilder::new()
            .status(request.status)
            .error_details(request.error_details)
            .log(log)
            .telemetry(request.telemetry)
            .artifacts(request.artifacts)
            .build();
        let updated = self
            .store()
            .complete_job(&job.id, update, &sync.changes())
            .await
            .map_err(|e| match e {
                DatabaseError::InvalidState(message) => input(message),
                other => other.into(),
            })?;
        self.discard_job_secret(&job.id).await;

        tracing::info!(
            job_id = %updated.id,
            phase = %updated.phase,
            status = %updated.status,
            artifacts = updated.artifacts.len(),
            modules_created = sync.create.len(),
            modules_deleted = sync.delete.len(),
            "job reported completion"
        );

        Ok(CollectArtifactsResponse {
            message: format!("Artifacts collected for job {}", updated.id),
        })
    }
}
