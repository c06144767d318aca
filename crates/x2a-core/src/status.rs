//! Status derivation for modules and projects.
//!
//! Pure functions over the latest job of each phase. Nothing here is stored;
//! callers recompute on every read.
//!
//! Module status follows phase precedence, not recency across phases:
//!
//! ```text
//! publish present?  → publish job status
//! migrate present?  → migrate job status
//! analyze present?  → analyze job status
//! otherwise         → pending
//! ```
//!
//! Project state, in evaluation order:
//!
//! ```text
//! failed        any module error | modules without init job | init error
//! created       no init job, no modules
//! initializing  init pending/running
//! completed     init success, every module finished
//! inProgress    init success, some module pending/running/waiting
//! initialized   init success, otherwise
//! ```

use crate::entities::Job;
use crate::enums::{JobStatus, ProjectState};
use crate::responses::{LatestPhaseJobs, ModuleStatus, ModuleView, ModulesSummary, ProjectStatus};

/// Derive a module's status from its latest per-phase jobs.
#[must_use]
pub fn module_status(jobs: &LatestPhaseJobs) -> ModuleStatus {
    let decisive = jobs
        .publish
        .as_ref()
        .or(jobs.migrate.as_ref())
        .or(jobs.analyze.as_ref());

    match decisive {
        Some(job) => ModuleStatus {
            status: job.status,
            error_details: job.error_details.clone(),
        },
        None => ModuleStatus {
            status: JobStatus::Pending,
            error_details: None,
        },
    }
}

/// Tally modules into mutually exclusive categories.
#[must_use]
pub fn summarize_modules(modules: &[ModuleView]) -> ModulesSummary {
    let mut summary = ModulesSummary::default();
    for module in modules {
        summary.total += 1;
        match module.status {
            JobStatus::Error => summary.error += 1,
            JobStatus::Running => summary.running += 1,
            JobStatus::Pending => summary.pending += 1,
            JobStatus::Success if module.is_finished() => summary.finished += 1,
            JobStatus::Success => summary.waiting += 1,
        }
    }
    summary
}

/// Derive a project's state and module summary from its modules and its
/// latest `init` job.
#[must_use]
pub fn project_status(init_job: Option<&Job>, modules: &[ModuleView]) -> ProjectStatus {
    let modules_summary = summarize_modules(modules);
    let state = project_state(init_job.map(|j| j.status), &modules_summary);
    ProjectStatus {
        state,
        modules_summary,
    }
}

fn project_state(init: Option<JobStatus>, summary: &ModulesSummary) -> ProjectState {
    if summary.error > 0 || (init.is_none() && summary.total > 0) || init == Some(JobStatus::Error) {
        return ProjectState::Failed;
    }

    match init {
        None => ProjectState::Created,
        Some(JobStatus::Pending | JobStatus::Running) => ProjectState::Initializing,
        Some(_) if summary.finished == summary.total => ProjectState::Completed,
        Some(_) if summary.pending + summary.running + summary.waiting > 0 => {
            ProjectState::InProgress
        }
        Some(_) => ProjectState::Initialized,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::entities::Module;
    use crate::enums::MigrationPhase;

    fn job(phase: MigrationPhase, status: JobStatus, minutes_ago: i64) -> Job {
        Job {
            id: format!("job-{phase}"),
            project_id: "prj-1".into(),
            module_id: phase.is_module_phase().then(|| "mod-1".to_string()),
            phase,
            status,
            started_at: Utc::now() - Duration::minutes(minutes_ago),
            finished_at: None,
            k8s_job_name: None,
            error_details: (status == JobStatus::Error).then(|| format!("{phase} failed")),
            telemetry: None,
            artifacts: Vec::new(),
        }
    }

    fn jobs(
        analyze: Option<JobStatus>,
        migrate: Option<JobStatus>,
        publish: Option<JobStatus>,
    ) -> LatestPhaseJobs {
        // Analyze is the most recent attempt on purpose: precedence must not
        // depend on timestamps.
        LatestPhaseJobs {
            analyze: analyze.map(|s| job(MigrationPhase::Analyze, s, 1)),
            migrate: migrate.map(|s| job(MigrationPhase::Migrate, s, 10)),
            publish: publish.map(|s| job(MigrationPhase::Publish, s, 20)),
        }
    }

    fn module_view(name: &str, jobs: LatestPhaseJobs) -> ModuleView {
        let status = module_status(&jobs);
        ModuleView {
            module: Module {
                id: format!("mod-{name}"),
                name: name.into(),
                source_path: format!("cookbooks/{name}"),
                project_id: "prj-1".into(),
            },
            status: status.status,
            error_details: status.error_details,
            jobs,
        }
    }

    use JobStatus::{Error, Pending, Running, Success};

    #[rstest]
    #[case::no_jobs(None, None, None, Pending)]
    #[case::analyze_retry_failed_after_publish(Some(Error), Some(Success), Some(Success), Success)]
    #[case::publish_failed(Some(Success), Some(Success), Some(Error), Error)]
    #[case::analyze_only(Some(Running), None, None, Running)]
    #[case::migrate_decides(Some(Success), Some(Pending), None, Pending)]
    fn module_status_follows_phase_precedence(
        #[case] analyze: Option<JobStatus>,
        #[case] migrate: Option<JobStatus>,
        #[case] publish: Option<JobStatus>,
        #[case] expected: JobStatus,
    ) {
        assert_eq!(module_status(&jobs(analyze, migrate, publish)).status, expected);
    }

    #[test]
    fn module_status_carries_error_details_of_decisive_job() {
        let status = module_status(&jobs(Some(Success), Some(Error), None));
        assert_eq!(status.error_details.as_deref(), Some("migrate failed"));

        let status = module_status(&jobs(Some(Error), Some(Success), None));
        assert_eq!(status.error_details, None);
    }

    #[test]
    fn created_without_init_and_modules() {
        let status = project_status(None, &[]);
        assert_eq!(status.state, ProjectState::Created);
        assert_eq!(status.modules_summary, ModulesSummary::default());
    }

    #[test]
    fn modules_without_init_job_is_failed() {
        let modules = [module_view("nginx", LatestPhaseJobs::default())];
        assert_eq!(project_status(None, &modules).state, ProjectState::Failed);
    }

    #[rstest]
    #[case(Success)]
    #[case(Running)]
    #[case(Error)]
    fn any_module_error_fails_project(#[case] init: JobStatus) {
        let init_job = job(MigrationPhase::Init, init, 30);
        let modules = [
            module_view("nginx", jobs(Some(Success), Some(Success), Some(Success))),
            module_view("mysql", jobs(Some(Error), None, None)),
        ];
        assert_eq!(project_status(Some(&init_job), &modules).state, ProjectState::Failed);
    }

    #[test]
    fn init_error_fails_project() {
        let init_job = job(MigrationPhase::Init, Error, 30);
        assert_eq!(project_status(Some(&init_job), &[]).state, ProjectState::Failed);
    }

    #[rstest]
    #[case(Pending)]
    #[case(Running)]
    fn active_init_is_initializing(#[case] init: JobStatus) {
        let init_job = job(MigrationPhase::Init, init, 30);
        assert_eq!(
            project_status(Some(&init_job), &[]).state,
            ProjectState::Initializing
        );
    }

    #[test]
    fn all_modules_published_is_completed() {
        let init_job = job(MigrationPhase::Init, Success, 30);
        let modules = [
            module_view("nginx", jobs(Some(Success), Some(Success), Some(Success))),
            module_view("mysql", jobs(Some(Error), Some(Success), Some(Success))),
        ];
        let status = project_status(Some(&init_job), &modules);
        assert_eq!(status.state, ProjectState::Completed);
        assert_eq!(status.modules_summary.finished, 2);
    }

    #[test]
    fn zero_modules_after_init_is_completed() {
        let init_job = job(MigrationPhase::Init, Success, 30);
        assert_eq!(
            project_status(Some(&init_job), &[]).state,
            ProjectState::Completed
        );
    }

    #[test]
    fn pending_module_keeps_project_in_progress() {
        let init_job = job(MigrationPhase::Init, Success, 30);
        let modules = [
            module_view("nginx", jobs(Some(Success), Some(Success), Some(Success))),
            module_view("mysql", LatestPhaseJobs::default()),
        ];
        assert_eq!(
            project_status(Some(&init_job), &modules).state,
            ProjectState::InProgress
        );
    }

    #[test]
    fn summary_counts_each_module_once() {
        let modules = [
            module_view("a", jobs(Some(Success), Some(Success), Some(Success))),
            module_view("b", jobs(Some(Success), Some(Success), None)),
            module_view("c", LatestPhaseJobs::default()),
            module_view("d", jobs(Some(Running), None, None)),
            module_view("e", jobs(Some(Success), Some(Error), None)),
        ];
        assert_eq!(
            summarize_modules(&modules),
            ModulesSummary {
                total: 5,
                finished: 1,
                waiting: 1,
                pending: 1,
                running: 1,
                error: 1,
            }
        );
    }
}
