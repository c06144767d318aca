//! Phase, status, artifact type, and project state enums for x2a.
//!
//! Stored values are lowercase/`snake_case`; project state uses `camelCase`
//! because it is only ever rendered to API clients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// MigrationPhase
// ---------------------------------------------------------------------------

/// One of the fixed stages of a migration, each executed as its own
/// containerized run.
///
/// ```text
/// init (project level) → analyze → migrate → publish (per module)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Init,
    Analyze,
    Migrate,
    Publish,
}

impl MigrationPhase {
    /// Phases that run against a single module.
    pub const MODULE_PHASES: [Self; 3] = [Self::Analyze, Self::Migrate, Self::Publish];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Analyze => "analyze",
            Self::Migrate => "migrate",
            Self::Publish => "publish",
        }
    }

    /// Whether a job of this phase belongs to a module (as opposed to the project).
    #[must_use]
    pub const fn is_module_phase(self) -> bool {
        !matches!(self, Self::Init)
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationPhase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "analyze" => Ok(Self::Analyze),
            "migrate" => Ok(Self::Migrate),
            "publish" => Ok(Self::Publish),
            other => Err(CoreError::Validation(format!("invalid phase '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Status of a job.
///
/// ```text
/// pending → running → success
///         ↘         ↘ error
///           success / error
/// ```
///
/// Terminal states have no successors; the transition into them happens
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl JobStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Running, Self::Success, Self::Error],
            Self::Running => &[Self::Success, Self::Error],
            Self::Success | Self::Error => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// `pending` or `running`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_active()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ArtifactType
// ---------------------------------------------------------------------------

/// Kind of output a job reports back through the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// High-level project migration plan (from `init`).
    MigrationPlan,
    /// Per-module migration plan (from `analyze`).
    ModuleMigrationPlan,
    /// Reference to the converted sources (from `migrate`).
    MigratedSources,
    /// Serialized `[{name, path}]` module list (from `init`).
    ProjectMetadata,
    /// Reference to the published target repository (from `publish`).
    PublishedSources,
}

impl ArtifactType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MigrationPlan => "migration_plan",
            Self::ModuleMigrationPlan => "module_migration_plan",
            Self::MigratedSources => "migrated_sources",
            Self::ProjectMetadata => "project_metadata",
            Self::PublishedSources => "published_sources",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectState
// ---------------------------------------------------------------------------

/// Human-facing state of a project, derived by [`crate::status::project_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ProjectState {
    Created,
    Initializing,
    Initialized,
    InProgress,
    Completed,
    Failed,
}

impl ProjectState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
