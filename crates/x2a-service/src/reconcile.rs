//! Pull-based repair of stale job records.
//!
//! A job whose record still says `pending`/`running` is checked against the
//! cluster. A terminal cluster status is persisted together with the final
//! logs; anything else leaves the record untouched. Reconciling a terminal
//! job is a no-op.

use chrono::{Duration, Utc};
use x2a_core::entities::Job;
use x2a_core::enums::JobStatus;
use x2a_db::error::DatabaseError;
use x2a_db::updates::job::JobUpdateBuilder;

use crate::error::OrchestrationError;
use crate::orchestrator::Orchestrator;

/// How long a reserved job may wait for its cluster Job name before it is
/// treated as an abandoned submission.
const SUBMISSION_GRACE: Duration = Duration::minutes(10);

impl Orchestrator {
    /// Bring one job record in line with the cluster and return the result.
    ///
    /// # Errors
    ///
    /// Returns `OrchestrationError::Cluster` if the status query fails, or
    /// `OrchestrationError::Database` if persisting the result fails.
    pub async fn reconcile_job(&self, job: Job) -> Result<Job, OrchestrationError> {
        if !job.status.is_active() {
            return Ok(job);
        }

        let Some(k8s_job_name) = job.k8s_job_name.clone() else {
            if Utc::now() - job.started_at > SUBMISSION_GRACE {
                tracing::warn!(job_id = %job.id, "job was reserved but never submitted");
                return self
                    .finish_from_cluster(
                        job,
                        JobStatus::Error,
                        Some("Job was never submitted to the cluster".to_string()),
                        None,
                    )
                    .await;
            }
            tracing::debug!(job_id = %job.id, "job not yet submitted, nothing to reconcile");
            return Ok(job);
        };

        let cluster_status = self.cluster().get_job_status(&k8s_job_name).await?;
        if cluster_status.status.is_active() {
            tracing::debug!(
                job_id = %job.id,
                cluster_status = %cluster_status.status,
                "job still active in cluster"
            );
            return Ok(job);
        }

        let log = match self.cluster().job_logs(&k8s_job_name).await {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "failed to fetch final job logs");
                None
            }
        };

        tracing::info!(
            job_id = %job.id,
            status = %cluster_status.status,
            "job reconciled from cluster"
        );
        self.finish_from_cluster(job, cluster_status.status, cluster_status.error_details, log)
            .await
    }

    async fn finish_from_cluster(
        &self,
        job: Job,
        status: JobStatus,
        error_details: Option<String>,
        log: Option<String>,
    ) -> Result<Job, OrchestrationError> {
        let mut update = JobUpdateBuilder::new()
            .status(status)
            .error_details(error_details);
        if log.is_some() {
            update = update.log(log);
        }

        let updated = match self.store().update_job(&job.id, update.build()).await {
            Ok(updated) => updated,
            // A callback finished the job first; its record wins.
            Err(DatabaseError::InvalidState(_)) => self
                .store()
                .get_job(&job.id)
                .await?
                .ok_or(DatabaseError::NoResult)?,
            Err(e) => return Err(e.into()),
        };
        self.discard_job_secret(&job.id).await;
        Ok(updated)
    }

    /// Reconcile every job in `jobs`, preserving order.
    pub(crate) async fn reconcile_all(&self, jobs: Vec<Job>) -> Result<Vec<Job>, OrchestrationError> {
        let mut out = Vec::with_capacity(jobs.len());
        for job in jobs {
            out.push(self.reconcile_job(job).await?);
        }
        Ok(out)
    }
}
