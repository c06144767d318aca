//! The cluster boundary: the only interface through which the rest of x2a
//! touches Kubernetes.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use x2a_core::enums::JobStatus;

use crate::error::ClusterError;
use crate::manifest::{self, Job, Secret};

/// A live log stream of a job's pod.
pub type LogStream = BoxStream<'static, Result<Bytes, ClusterError>>;

/// Authoritative status of a Kubernetes Job, reduced to x2a's four states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterJobStatus {
    pub status: JobStatus,
    pub error_details: Option<String>,
}

impl ClusterJobStatus {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: JobStatus::Error,
            error_details: Some("Job not found".to_string()),
        }
    }
}

/// Reduce raw Job counters and conditions to one [`JobStatus`].
///
/// Precedence: any succeeded pod wins, then any active pod (a retry may be
/// running after earlier failures), then failures or a `Failed` condition.
/// Anything else has not started yet.
#[must_use]
pub fn translate_job_status(raw: Option<&manifest::JobStatus>) -> ClusterJobStatus {
    let Some(raw) = raw else {
        return ClusterJobStatus {
            status: JobStatus::Pending,
            error_details: None,
        };
    };

    let positive = |n: Option<i32>| n.unwrap_or(0) > 0;
    let failed_condition = raw
        .conditions
        .iter()
        .find(|c| c.condition_type == "Failed" && c.status == "True");

    if positive(raw.succeeded) {
        return ClusterJobStatus {
            status: JobStatus::Success,
            error_details: None,
        };
    }
    if positive(raw.active) {
        return ClusterJobStatus {
            status: JobStatus::Running,
            error_details: None,
        };
    }
    if positive(raw.failed) || failed_condition.is_some() {
        let details = failed_condition
            .and_then(|c| c.message.clone().or_else(|| c.reason.clone()))
            .unwrap_or_else(|| "Job failed".to_string());
        return ClusterJobStatus {
            status: JobStatus::Error,
            error_details: Some(details),
        };
    }
    ClusterJobStatus {
        status: JobStatus::Pending,
        error_details: None,
    }
}

/// A Job as created by the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub name: String,
    pub uid: String,
}

/// Typed access to Secrets, Jobs, and job logs in the configured namespace.
///
/// Reads and deletes of absent objects are not errors: `get_*` return `None`
/// or a not-found status and `delete_*` succeed.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create_secret(&self, secret: &Secret) -> Result<(), ClusterError>;

    /// Create the Secret, or replace an existing one of the same name in
    /// place.
    async fn apply_secret(&self, secret: &Secret) -> Result<(), ClusterError>;

    /// Make `owner` the Secret's owner so it is deleted with the Job.
    async fn set_secret_owner(&self, name: &str, owner: &JobRef) -> Result<(), ClusterError>;

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>, ClusterError>;

    async fn delete_secret(&self, name: &str) -> Result<(), ClusterError>;

    /// Submit a Job; returns the name and uid it was created under.
    async fn create_job(&self, job: &Job) -> Result<JobRef, ClusterError>;

    /// A missing Job reports [`ClusterJobStatus::not_found`].
    async fn get_job_status(&self, name: &str) -> Result<ClusterJobStatus, ClusterError>;

    /// Delete a Job and, in the background, its pods.
    async fn delete_job(&self, name: &str) -> Result<(), ClusterError>;

    async fn list_jobs(&self, label_selector: &str) -> Result<Vec<Job>, ClusterError>;

    /// Buffered logs of the job's pod; empty when no pod exists yet.
    async fn job_logs(&self, job_name: &str) -> Result<String, ClusterError>;

    /// Follow the logs of the job's pod; an empty stream when no pod exists.
    async fn stream_job_logs(&self, job_name: &str) -> Result<LogStream, ClusterError>;
}
