//! Response and view types returned as JSON by the x2a HTTP API.
//!
//! Views pair a stored entity with the status derived for it on read; nothing
//! in here is persisted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Job, Module, Project};
use crate::enums::{JobStatus, MigrationPhase, ProjectState};

/// Latest job of each module phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatestPhaseJobs {
    pub analyze: Option<Job>,
    pub migrate: Option<Job>,
    pub publish: Option<Job>,
}

impl LatestPhaseJobs {
    /// Mutable slot for a module phase; `None` for `init`.
    pub fn slot_mut(&mut self, phase: MigrationPhase) -> Option<&mut Option<Job>> {
        match phase {
            MigrationPhase::Init => None,
            MigrationPhase::Analyze => Some(&mut self.analyze),
            MigrationPhase::Migrate => Some(&mut self.migrate),
            MigrationPhase::Publish => Some(&mut self.publish),
        }
    }
}

/// Derived status of a module.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStatus {
    pub status: JobStatus,
    pub error_details: Option<String>,
}

/// A module with its derived status and latest per-phase jobs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    #[serde(flatten)]
    pub module: Module,
    pub status: JobStatus,
    pub error_details: Option<String>,
    #[serde(flatten)]
    pub jobs: LatestPhaseJobs,
}

impl ModuleView {
    /// `success` status with a successful `publish` job.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Success
            && self
                .jobs
                .publish
                .as_ref()
                .is_some_and(|j| j.status == JobStatus::Success)
    }
}

/// Per-category module counts. Every module lands in exactly one of
/// `finished`, `waiting`, `pending`, `running`, `error`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModulesSummary {
    pub total: u32,
    pub finished: u32,
    pub waiting: u32,
    pub pending: u32,
    pub running: u32,
    pub error: u32,
}

/// Derived status of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub state: ProjectState,
    pub modules_summary: ModulesSummary,
}

/// A project with its derived status and latest `init` job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub status: ProjectStatus,
    pub init_job: Option<Job>,
}

/// Response to a successful run submission.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub status: JobStatus,
    pub job_id: String,
}

/// Response to an accepted callback.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CollectArtifactsResponse {
    pub message: String,
}
