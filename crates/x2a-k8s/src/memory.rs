//! In-process [`ClusterApi`] holding Secrets and Jobs in memory.
//!
//! Job status and logs are set by the owner, which makes the cluster's side
//! of a run scriptable in orchestration tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use crate::error::ClusterError;
use crate::gateway::{ClusterApi, ClusterJobStatus, JobRef, LogStream};
use crate::manifest::{Job, OwnerReference, Secret};

#[derive(Default)]
struct State {
    secrets: BTreeMap<String, Secret>,
    jobs: BTreeMap<String, (Job, ClusterJobStatus)>,
    logs: BTreeMap<String, String>,
    fail_job_creation: Option<String>,
}

#[derive(Default)]
pub struct InMemoryCluster {
    state: Mutex<State>,
}

fn already_exists(kind: &str, name: &str) -> ClusterError {
    ClusterError::Api {
        status: 409,
        message: format!("{kind} \"{name}\" already exists"),
    }
}

fn matches_selector(job: &Job, selector: &str) -> bool {
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => job.metadata.labels.get(key).is_some_and(|v| v == value),
            None => job.metadata.labels.contains_key(term),
        })
}

impl InMemoryCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report `status` for the named Job from now on.
    pub fn set_job_status(&self, name: &str, status: ClusterJobStatus) {
        if let Some((_, current)) = self.lock().jobs.get_mut(name) {
            *current = status;
        }
    }

    pub fn set_logs(&self, job_name: &str, logs: impl Into<String>) {
        self.lock().logs.insert(job_name.to_string(), logs.into());
    }

    /// Make every following `create_job` fail with a 500 carrying `message`.
    pub fn fail_job_creation(&self, message: impl Into<String>) {
        self.lock().fail_job_creation = Some(message.into());
    }

    #[must_use]
    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.lock().secrets.get(name).cloned()
    }

    #[must_use]
    pub fn secret_names(&self) -> Vec<String> {
        self.lock().secrets.keys().cloned().collect()
    }

    #[must_use]
    pub fn job(&self, name: &str) -> Option<Job> {
        self.lock().jobs.get(name).map(|(job, _)| job.clone())
    }

    #[must_use]
    pub fn job_names(&self) -> Vec<String> {
        self.lock().jobs.keys().cloned().collect()
    }
}

#[async_trait]
impl ClusterApi for InMemoryCluster {
    async fn create_secret(&self, secret: &Secret) -> Result<(), ClusterError> {
        let mut state = self.lock();
        let name = &secret.metadata.name;
        if state.secrets.contains_key(name) {
            return Err(already_exists("secrets", name));
        }
        state.secrets.insert(name.clone(), secret.clone());
        Ok(())
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<(), ClusterError> {
        self.lock()
            .secrets
            .insert(secret.metadata.name.clone(), secret.clone());
        Ok(())
    }

    async fn set_secret_owner(&self, name: &str, owner: &JobRef) -> Result<(), ClusterError> {
        let mut state = self.lock();
        let secret = state.secrets.get_mut(name).ok_or_else(|| ClusterError::Api {
            status: 404,
            message: format!("secrets \"{name}\" not found"),
        })?;
        secret.metadata.owner_references = vec![OwnerReference::job(&owner.name, &owner.uid)];
        Ok(())
    }

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>, ClusterError> {
        Ok(self.secret(name))
    }

    async fn delete_secret(&self, name: &str) -> Result<(), ClusterError> {
        self.lock().secrets.remove(name);
        Ok(())
    }

    async fn create_job(&self, job: &Job) -> Result<JobRef, ClusterError> {
        let mut state = self.lock();
        if let Some(message) = &state.fail_job_creation {
            return Err(ClusterError::Api {
                status: 500,
                message: message.clone(),
            });
        }
        let name = job.metadata.name.clone();
        if state.jobs.contains_key(&name) {
            return Err(already_exists("jobs.batch", &name));
        }
        let pending = ClusterJobStatus {
            status: x2a_core::enums::JobStatus::Pending,
            error_details: None,
        };
        let mut created = job.clone();
        created.metadata.uid = format!("uid-{name}");
        let job_ref = JobRef {
            name: name.clone(),
            uid: created.metadata.uid.clone(),
        };
        state.jobs.insert(name, (created, pending));
        Ok(job_ref)
    }

    async fn get_job_status(&self, name: &str) -> Result<ClusterJobStatus, ClusterError> {
        Ok(self
            .lock()
            .jobs
            .get(name)
            .map_or_else(ClusterJobStatus::not_found, |(_, status)| status.clone()))
    }

    /// Owned Secrets go with the Job, as the garbage collector would do.
    async fn delete_job(&self, name: &str) -> Result<(), ClusterError> {
        let mut state = self.lock();
        if let Some((job, _)) = state.jobs.remove(name) {
            let uid = job.metadata.uid;
            state
                .secrets
                .retain(|_, s| !s.metadata.owner_references.iter().any(|o| o.uid == uid));
        }
        state.logs.remove(name);
        Ok(())
    }

    async fn list_jobs(&self, label_selector: &str) -> Result<Vec<Job>, ClusterError> {
        Ok(self
            .lock()
            .jobs
            .values()
            .filter(|(job, _)| matches_selector(job, label_selector))
            .map(|(job, _)| job.clone())
            .collect())
    }

    async fn job_logs(&self, job_name: &str) -> Result<String, ClusterError> {
        Ok(self.lock().logs.get(job_name).cloned().unwrap_or_default())
    }

    async fn stream_job_logs(&self, job_name: &str) -> Result<LogStream, ClusterError> {
        let logs = self.lock().logs.get(job_name).cloned();
        Ok(match logs {
            Some(logs) => futures::stream::iter([Ok(Bytes::from(logs))]).boxed(),
            None => futures::stream::empty().boxed(),
        })
    }
}
