//! Job update builder.

use chrono::{DateTime, Utc};
use serde::Serialize;
use x2a_core::entities::NewArtifact;
use x2a_core::enums::JobStatus;

/// Partial job mutation. `Some(None)` clears a nullable column.
///
/// `artifacts`, when present, replaces the job's whole artifact list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k8s_job_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Option<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<NewArtifact>>,
}

impl JobUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.finished_at.is_none()
            && self.k8s_job_name.is_none()
            && self.error_details.is_none()
            && self.log.is_none()
            && self.telemetry.is_none()
            && self.artifacts.is_none()
    }
}

pub struct JobUpdateBuilder(JobUpdate);

impl JobUpdateBuilder {
    pub fn new() -> Self {
        Self(JobUpdate::default())
    }

    pub fn status(mut self, val: JobStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    pub fn finished_at(mut self, val: Option<DateTime<Utc>>) -> Self {
        self.0.finished_at = Some(val);
        self
    }

    pub fn k8s_job_name(mut self, val: impl Into<String>) -> Self {
        self.0.k8s_job_name = Some(Some(val.into()));
        self
    }

    pub fn error_details(mut self, val: Option<String>) -> Self {
        self.0.error_details = Some(val);
        self
    }

    pub fn log(mut self, val: Option<String>) -> Self {
        self.0.log = Some(val);
        self
    }

    pub fn telemetry(mut self, val: Option<serde_json::Value>) -> Self {
        self.0.telemetry = Some(val);
        self
    }

    pub fn artifacts(mut self, val: Vec<NewArtifact>) -> Self {
        self.0.artifacts = Some(val);
        self
    }

    pub fn build(self) -> JobUpdate {
        self.0
    }
}

impl Default for JobUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
