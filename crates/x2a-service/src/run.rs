//! Run submission: validate, detect in-flight jobs, reserve the job record,
//! then create Secrets and the Kubernetes Job.

use x2a_core::entities::{Job, Module, Project};
use x2a_core::enums::{JobStatus, MigrationPhase};
use x2a_core::identity::CallerIdentity;
use x2a_core::ids::random_hex;
use x2a_core::responses::RunResponse;
use x2a_db::error::DatabaseError;
use x2a_db::repos::job::JobFilter;
use x2a_db::updates::job::JobUpdateBuilder;
use x2a_k8s::builder::{JobRequest, job_secret_name};
use x2a_k8s::gateway::JobRef;
use x2a_k8s::credentials::{RepoAuth, resolve_aap, validate_llm};
use x2a_k8s::SpecError;

use crate::error::OrchestrationError;
use crate::orchestrator::Orchestrator;
use crate::requests::RunRequest;

/// Bytes of entropy in a callback token.
const CALLBACK_TOKEN_BYTES: usize = 32;

fn repo_auth<'a>(auth: Option<&'a RepoAuth>, field: &str) -> Result<&'a RepoAuth, OrchestrationError> {
    auth.filter(|a| !a.token.trim().is_empty())
        .ok_or_else(|| OrchestrationError::Input(format!("{field}.token is required")))
}

impl Orchestrator {
    /// Start the `init` phase of a project.
    ///
    /// # Errors
    ///
    /// `NotFound` if the project is not writable by the caller, `Input` for
    /// a non-`init` phase or missing credentials, `Conflict` if an init job
    /// is still active after reconciliation, `Cluster` if submission fails.
    pub async fn run_project_init(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        request: &RunRequest,
    ) -> Result<RunResponse, OrchestrationError> {
        if let Some(phase) = request.phase.filter(|p| *p != MigrationPhase::Init) {
            return Err(OrchestrationError::Input(format!(
                "invalid phase '{phase}' for a project run, expected 'init'"
            )));
        }
        let project = self.project_in_scope(project_id, &caller.write_scope()).await?;
        self.submit(&project, None, MigrationPhase::Init, request).await
    }

    /// Start `analyze`, `migrate`, or `publish` for one module.
    ///
    /// # Errors
    ///
    /// As [`Self::run_project_init`], plus `Input` when the phase is missing
    /// or is `init`, and `NotFound` for an unknown module.
    pub async fn run_module(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        module_id: &str,
        request: &RunRequest,
    ) -> Result<RunResponse, OrchestrationError> {
        let phase = match request.phase {
            Some(phase) if phase.is_module_phase() => phase,
            Some(phase) => {
                return Err(OrchestrationError::Input(format!(
                    "invalid phase '{phase}' for a module run, expected one of analyze, migrate, publish"
                )));
            }
            None => return Err(OrchestrationError::Input("phase is required".to_string())),
        };
        let project = self.project_in_scope(project_id, &caller.write_scope()).await?;
        let module = self.module_of(project_id, module_id).await?;
        self.submit(&project, Some(&module), phase, request).await
    }

    async fn submit(
        &self,
        project: &Project,
        module: Option<&Module>,
        phase: MigrationPhase,
        request: &RunRequest,
    ) -> Result<RunResponse, OrchestrationError> {
        let source_auth = repo_auth(request.source_repo_auth.as_ref(), "sourceRepoAuth")?;
        let target_auth = repo_auth(request.target_repo_auth.as_ref(), "targetRepoAuth")?;
        let aap = resolve_aap(request.aap_credentials.as_ref(), &self.settings().aap)?;
        validate_llm(&self.settings().llm)?;

        let module_id = module.map(|m| m.id.as_str());
        self.ensure_no_active_job(&project.id, module_id, phase).await?;

        let callback_token = random_hex(CALLBACK_TOKEN_BYTES)
            .map_err(|e| SpecError::Random(e.to_string()))?;
        let job = match self
            .store()
            .create_job(&project.id, module_id, phase, &callback_token)
            .await
        {
            Ok(job) => job,
            Err(DatabaseError::ActiveJobExists { .. }) => {
                // Lost a race with a concurrent submission.
                return Err(self.conflict_with_active(&project.id, module_id, phase).await);
            }
            Err(e) => return Err(e.into()),
        };

        let manifest = match self.builder().job(&JobRequest {
            job_id: &job.id,
            phase,
            project,
            module,
            user_prompt: request.user_prompt.as_deref(),
        }) {
            Ok(manifest) => manifest,
            Err(e) => {
                self.mark_submission_failed(&job, &e.to_string()).await;
                return Err(e.into());
            }
        };

        let submitted: Result<JobRef, OrchestrationError> = async {
            let project_secret = self
                .builder()
                .project_secret(&project.id, &self.settings().llm, &aap)?;
            self.cluster().apply_secret(&project_secret).await?;

            let job_secret = self.builder().job_secret(
                &job.id,
                project,
                source_auth,
                target_auth,
                &callback_token,
            )?;
            self.cluster().create_secret(&job_secret).await?;

            Ok(self.cluster().create_job(&manifest).await?)
        }
        .await;

        let created = match submitted {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "job submission failed");
                self.discard_job_secret(&job.id).await;
                self.mark_submission_failed(&job, &e.to_string()).await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .cluster()
            .set_secret_owner(&job_secret_name(&job.id), &created)
            .await
        {
            tracing::warn!(job_id = %job.id, error = %e, "failed to attach job secret to its Job");
        }
        let k8s_job_name = created.name;

        self.store()
            .update_job(&job.id, JobUpdateBuilder::new().k8s_job_name(&k8s_job_name).build())
            .await?;

        tracing::info!(
            job_id = %job.id,
            project_id = %project.id,
            module_id = module_id.unwrap_or_default(),
            %phase,
            k8s_job = %k8s_job_name,
            "run submitted"
        );
        Ok(RunResponse {
            status: JobStatus::Pending,
            job_id: job.id,
        })
    }

    /// Reconcile every active job of the target and fail if one survives.
    async fn ensure_no_active_job(
        &self,
        project_id: &str,
        module_id: Option<&str>,
        phase: MigrationPhase,
    ) -> Result<(), OrchestrationError> {
        let active = self
            .store()
            .list_jobs(&active_filter(project_id, module_id))
            .await?;
        for job in self.reconcile_all(active).await? {
            if job.status.is_active() {
                tracing::info!(
                    active_job_id = %job.id,
                    requested_phase = %phase,
                    "run rejected, job already active"
                );
                return Err(OrchestrationError::Conflict {
                    active_job_id: job.id,
                    active_job_phase: job.phase,
                });
            }
        }
        Ok(())
    }

    async fn conflict_with_active(
        &self,
        project_id: &str,
        module_id: Option<&str>,
        phase: MigrationPhase,
    ) -> OrchestrationError {
        let filter = active_filter(project_id, module_id).last_job_only();
        match self.store().list_jobs(&filter).await {
            Ok(jobs) => match jobs.into_iter().next() {
                Some(job) => OrchestrationError::Conflict {
                    active_job_id: job.id,
                    active_job_phase: job.phase,
                },
                None => OrchestrationError::Input(format!(
                    "a concurrent {phase} run was rejected, retry the request"
                )),
            },
            Err(e) => e.into(),
        }
    }

    async fn mark_submission_failed(&self, job: &Job, details: &str) {
        let update = JobUpdateBuilder::new()
            .status(JobStatus::Error)
            .error_details(Some(details.to_string()))
            .build();
        if let Err(e) = self.store().update_job(&job.id, update).await {
            tracing::warn!(job_id = %job.id, error = %e, "failed to record submission failure");
        }
    }
}

/// The jobs that block a new run: the project's init jobs, or any job of
/// the module.
fn active_filter(project_id: &str, module_id: Option<&str>) -> JobFilter {
    let filter = JobFilter::for_project(project_id).active();
    match module_id {
        Some(module_id) => filter.module(module_id),
        None => filter.phase(MigrationPhase::Init),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use x2a_k8s::builder::{LABEL_MODULE, LABEL_PHASE, job_secret_name, project_secret_name};
    use x2a_k8s::gateway::ClusterJobStatus;

    use super::*;
    use crate::test_support::{Harness, owner, run_request, stranger};

    #[tokio::test]
    async fn init_run_submits_secrets_and_job() {
        let h = Harness::new().await;
        let project = h.project().await;

        let response = h.run_init(&project.id).await;
        assert_eq!(response.status, JobStatus::Pending);

        let job = h.store.get_job(&response.job_id).await.unwrap().unwrap();
        assert_eq!(job.phase, MigrationPhase::Init);
        let k8s_name = job.k8s_job_name.clone().unwrap();
        assert!(k8s_name.starts_with("job-x2a-init-"));

        let manifest = h.cluster.job(&k8s_name).unwrap();
        assert_eq!(manifest.metadata.labels[LABEL_PHASE], "init");
        assert!(h.cluster.secret(&project_secret_name(&project.id)).is_some());
        let job_secret = h.cluster.secret(&job_secret_name(&job.id)).unwrap();
        let owners = &job_secret.metadata.owner_references;
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "Job");
        assert_eq!(owners[0].name, k8s_name);
        assert_eq!(owners[0].uid, manifest.metadata.uid);
        let token = h.callback_token(&job.id);
        assert_eq!(token.len(), CALLBACK_TOKEN_BYTES * 2);
        assert!(h.store.verify_callback_token(&job.id, &token).await.unwrap());
    }

    #[tokio::test]
    async fn second_run_while_active_conflicts() {
        let h = Harness::new().await;
        let project = h.project().await;
        let first = h.run_init(&project.id).await;

        let err = h
            .orch
            .run_project_init(&owner(), &project.id, &run_request(None))
            .await
            .unwrap_err();
        match err {
            OrchestrationError::Conflict {
                active_job_id,
                active_job_phase,
            } => {
                assert_eq!(active_job_id, first.job_id);
                assert_eq!(active_job_phase, MigrationPhase::Init);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn finished_cluster_job_frees_the_slot() {
        let h = Harness::new().await;
        let project = h.project().await;
        let first = h.run_init(&project.id).await;
        let k8s_name = h
            .store
            .get_job(&first.job_id)
            .await
            .unwrap()
            .unwrap()
            .k8s_job_name
            .unwrap();
        h.cluster.set_job_status(
            &k8s_name,
            ClusterJobStatus {
                status: JobStatus::Error,
                error_details: Some("BackoffLimitExceeded".into()),
            },
        );

        let second = h.run_init(&project.id).await;
        assert_ne!(second.job_id, first.job_id);

        let first = h.store.get_job(&first.job_id).await.unwrap().unwrap();
        assert_eq!(first.status, JobStatus::Error);
        assert_eq!(first.error_details.as_deref(), Some("BackoffLimitExceeded"));
        assert!(h.cluster.secret(&job_secret_name(&first.id)).is_none());
        assert!(h.cluster.secret(&project_secret_name(&project.id)).is_some());
    }

    #[tokio::test]
    async fn module_runs_are_independent_per_module() {
        let h = Harness::new().await;
        let project = h.project().await;
        let nginx = h.module(&project.id, "nginx").await;
        let mysql = h.module(&project.id, "mysql").await;
        let request = run_request(Some(MigrationPhase::Analyze));

        let a = h.orch.run_module(&owner(), &project.id, &nginx.id, &request).await.unwrap();
        h.orch.run_module(&owner(), &project.id, &mysql.id, &request).await.unwrap();

        let migrate = run_request(Some(MigrationPhase::Migrate));
        let err = h
            .orch
            .run_module(&owner(), &project.id, &nginx.id, &migrate)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Conflict { ref active_job_id, .. } if *active_job_id == a.job_id));

        let job = h.store.get_job(&a.job_id).await.unwrap().unwrap();
        let manifest = h.cluster.job(job.k8s_job_name.as_deref().unwrap()).unwrap();
        assert_eq!(manifest.metadata.labels[LABEL_MODULE], "nginx");
    }

    #[rstest]
    #[case::missing_phase(None, "phase is required")]
    #[case::init_phase(Some(MigrationPhase::Init), "invalid phase 'init'")]
    #[tokio::test]
    async fn module_run_needs_module_phase(
        #[case] phase: Option<MigrationPhase>,
        #[case] message: &str,
    ) {
        let h = Harness::new().await;
        let project = h.project().await;
        let module = h.module(&project.id, "nginx").await;

        let err = h
            .orch
            .run_module(&owner(), &project.id, &module.id, &run_request(phase))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Input(ref m) if m.starts_with(message)), "{err}");
    }

    #[tokio::test]
    async fn project_run_rejects_module_phase() {
        let h = Harness::new().await;
        let project = h.project().await;
        let err = h
            .orch
            .run_project_init(&owner(), &project.id, &run_request(Some(MigrationPhase::Publish)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Input(_)));
    }

    #[tokio::test]
    async fn missing_repo_token_is_input_error() {
        let h = Harness::new().await;
        let project = h.project().await;
        let mut request = run_request(None);
        request.target_repo_auth = None;

        let err = h
            .orch
            .run_project_init(&owner(), &project.id, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Input(ref m) if m == "targetRepoAuth.token is required"));
        assert!(h.cluster.job_names().is_empty());
    }

    #[tokio::test]
    async fn strangers_cannot_run() {
        let h = Harness::new().await;
        let project = h.project().await;
        let err = h
            .orch
            .run_project_init(&stranger(), &project.id, &run_request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_submission_cleans_up() {
        let h = Harness::new().await;
        let project = h.project().await;
        h.cluster.fail_job_creation("quota exceeded");

        let err = h
            .orch
            .run_project_init(&owner(), &project.id, &run_request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Cluster(_)));

        let jobs = h
            .store
            .list_jobs(&JobFilter::for_project(&project.id))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Error);
        assert!(jobs[0].error_details.as_deref().unwrap().contains("quota exceeded"));
        assert!(h.cluster.secret(&job_secret_name(&jobs[0].id)).is_none());
    }
}
