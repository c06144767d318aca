//! Job repository: creation under the single-active-job constraint, filtered
//! listing with latest-only lookups, transition-checked updates, and the two
//! private-column readers (log and callback token).

use std::collections::HashMap;

use chrono::Utc;

use x2a_core::entities::Job;
use x2a_core::enums::{JobStatus, MigrationPhase};
use x2a_core::ids::{PREFIX_JOB, PREFIX_MODULE};
use x2a_core::responses::LatestPhaseJobs;

use crate::error::DatabaseError;
use crate::helpers::{
    constant_time_eq, get_opt_string, is_unique_violation, parse_datetime, parse_enum,
    parse_optional_datetime, parse_optional_json, timestamp,
};
use crate::repos::artifact::replace_artifacts;
use crate::repos::module::{insert_module, remove_module};
use crate::service::MigrationStore;
use crate::updates::job::JobUpdate;
use crate::updates::module::ModuleChanges;

/// Public columns only: `callback_token` and `log` never leave the store
/// through a `Job`.
const SELECT_COLS: &str = "id, project_id, module_id, phase, status, started_at, finished_at, \
     k8s_job_name, error_details, telemetry";

const LATEST_FIRST: &str = "ORDER BY started_at DESC, rowid DESC";

/// Criteria for [`MigrationStore::list_jobs`]. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub project_id: String,
    pub module_id: Option<String>,
    pub phase: Option<MigrationPhase>,
    /// Match any of these statuses; empty matches all.
    pub statuses: Vec<JobStatus>,
    /// Return at most the most recently started match.
    pub last_job_only: bool,
}

impl JobFilter {
    #[must_use]
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn module(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = Some(module_id.into());
        self
    }

    #[must_use]
    pub const fn phase(mut self, phase: MigrationPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn active(mut self) -> Self {
        self.statuses = vec![JobStatus::Pending, JobStatus::Running];
        self
    }

    #[must_use]
    pub const fn last_job_only(mut self) -> Self {
        self.last_job_only = true;
        self
    }
}

fn row_to_job_without_artifacts(row: &libsql::Row) -> Result<Job, DatabaseError> {
    let finished_at = get_opt_string(row, 6)?;
    let telemetry = get_opt_string(row, 9)?;
    Ok(Job {
        id: row.get::<String>(0)?,
        project_id: row.get::<String>(1)?,
        module_id: get_opt_string(row, 2)?,
        phase: parse_enum(&row.get::<String>(3)?)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        started_at: parse_datetime(&row.get::<String>(5)?)?,
        finished_at: parse_optional_datetime(finished_at.as_deref())?,
        k8s_job_name: get_opt_string(row, 7)?,
        error_details: get_opt_string(row, 8)?,
        telemetry: parse_optional_json(telemetry.as_deref())?,
        artifacts: Vec::new(),
    })
}

/// Write `update` on the caller's transaction and return the job's project.
async fn apply_job_update(
    conn: &libsql::Connection,
    id: &str,
    update: &JobUpdate,
) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query("SELECT status, project_id FROM jobs WHERE id = ?1", [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    let current: JobStatus = parse_enum(&row.get::<String>(0)?)?;
    let project_id = row.get::<String>(1)?;
    drop(rows);

    let mut sets = Vec::new();
    let mut params: Vec<libsql::Value> = Vec::new();
    let mut idx = 1;

    if let Some(next) = update.status {
        if current.is_terminal() {
            return Err(DatabaseError::InvalidState(format!(
                "job {id} already finished with status {current}"
            )));
        }
        if next != current && !current.can_transition_to(next) {
            return Err(DatabaseError::InvalidState(format!(
                "Cannot transition job {id} from {current} to {next}"
            )));
        }
        sets.push(format!("status = ?{idx}"));
        params.push(next.as_str().into());
        idx += 1;

        if next.is_terminal() && update.finished_at.is_none() {
            sets.push(format!("finished_at = ?{idx}"));
            params.push(timestamp(Utc::now()).into());
            idx += 1;
        }
    }
    if let Some(ref finished_at) = update.finished_at {
        sets.push(format!("finished_at = ?{idx}"));
        params.push(finished_at.map(timestamp).into());
        idx += 1;
    }
    if let Some(ref name) = update.k8s_job_name {
        sets.push(format!("k8s_job_name = ?{idx}"));
        params.push(name.as_deref().into());
        idx += 1;
    }
    if let Some(ref details) = update.error_details {
        sets.push(format!("error_details = ?{idx}"));
        params.push(details.as_deref().into());
        idx += 1;
    }
    if let Some(ref log) = update.log {
        sets.push(format!("log = ?{idx}"));
        params.push(log.as_deref().into());
        idx += 1;
    }
    if let Some(ref telemetry) = update.telemetry {
        let json = telemetry
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DatabaseError::Other(e.into()))?;
        sets.push(format!("telemetry = ?{idx}"));
        params.push(json.into());
        idx += 1;
    }

    if !sets.is_empty() {
        params.push(id.into());
        let sql = format!("UPDATE jobs SET {} WHERE id = ?{idx}", sets.join(", "));
        conn.execute(&sql, libsql::params_from_iter(params)).await?;
    }

    if let Some(ref artifacts) = update.artifacts {
        replace_artifacts(conn, id, artifacts).await?;
    }
    Ok(project_id)
}

impl MigrationStore {
    /// Record a new `pending` job.
    ///
    /// `module_id` must be `None` exactly when `phase` is `init`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ActiveJobExists` if a pending or running job
    /// already exists for the same project (init) or module.
    pub async fn create_job(
        &self,
        project_id: &str,
        module_id: Option<&str>,
        phase: MigrationPhase,
        callback_token: &str,
    ) -> Result<Job, DatabaseError> {
        if phase.is_module_phase() == module_id.is_none() {
            return Err(DatabaseError::InvalidState(format!(
                "phase {phase} {} a module",
                if module_id.is_some() { "must not reference" } else { "requires" }
            )));
        }

        let id = self.db().generate_id(PREFIX_JOB).await?;
        let started_at = timestamp(Utc::now());

        let _guard = self.write_guard().await;
        self.db()
            .conn()
            .execute(
                "INSERT INTO jobs (id, project_id, module_id, phase, status, started_at, callback_token)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    project_id,
                    module_id,
                    phase.as_str(),
                    started_at.as_str(),
                    callback_token
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::ActiveJobExists {
                        project_id: project_id.to_string(),
                        module_id: module_id.map(String::from),
                    }
                } else {
                    DatabaseError::from(e)
                }
            })?;

        Ok(Job {
            id,
            project_id: project_id.to_string(),
            module_id: module_id.map(String::from),
            phase,
            status: JobStatus::Pending,
            started_at: parse_datetime(&started_at)?,
            finished_at: None,
            k8s_job_name: None,
            error_details: None,
            telemetry: None,
            artifacts: Vec::new(),
        })
    }

    /// Fetch a job with its artifacts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_job(&self, id: &str) -> Result<Option<Job>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM jobs WHERE id = ?1"), [id])
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut job = row_to_job_without_artifacts(&row)?;
        drop(rows);
        job.artifacts = self.list_artifacts(&job.id).await?;
        Ok(Some(job))
    }

    /// List jobs matching `filter`, most recently started first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError> {
        let mut clauses = vec!["project_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![filter.project_id.as_str().into()];
        let mut idx = 2;

        if let Some(ref module_id) = filter.module_id {
            clauses.push(format!("module_id = ?{idx}"));
            params.push(module_id.as_str().into());
            idx += 1;
        }
        if let Some(phase) = filter.phase {
            clauses.push(format!("phase = ?{idx}"));
            params.push(phase.as_str().into());
            idx += 1;
        }
        if !filter.statuses.is_empty() {
            let mut placeholders = Vec::with_capacity(filter.statuses.len());
            for status in &filter.statuses {
                placeholders.push(format!("?{idx}"));
                params.push(status.as_str().into());
                idx += 1;
            }
            clauses.push(format!("status IN ({})", placeholders.join(", ")));
        }

        let limit = if filter.last_job_only { " LIMIT 1" } else { "" };
        let sql = format!(
            "SELECT {SELECT_COLS} FROM jobs WHERE {} {LATEST_FIRST}{limit}",
            clauses.join(" AND ")
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(row_to_job_without_artifacts(&row)?);
        }
        drop(rows);

        for job in &mut jobs {
            job.artifacts = self.list_artifacts(&job.id).await?;
        }
        Ok(jobs)
    }

    /// Latest `init` job of a project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_init_job(&self, project_id: &str) -> Result<Option<Job>, DatabaseError> {
        let filter = JobFilter::for_project(project_id)
            .phase(MigrationPhase::Init)
            .last_job_only();
        Ok(self.list_jobs(&filter).await?.into_iter().next())
    }

    /// Latest analyze/migrate/publish job of one module.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_module_jobs(
        &self,
        project_id: &str,
        module_id: &str,
    ) -> Result<LatestPhaseJobs, DatabaseError> {
        let mut latest = LatestPhaseJobs::default();
        for phase in MigrationPhase::MODULE_PHASES {
            let filter = JobFilter::for_project(project_id)
                .module(module_id)
                .phase(phase)
                .last_job_only();
            if let Some(slot) = latest.slot_mut(phase) {
                *slot = self.list_jobs(&filter).await?.into_iter().next();
            }
        }
        Ok(latest)
    }

    /// Latest analyze/migrate/publish job of every module of a project,
    /// keyed by module id. Modules without jobs are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_jobs_by_module(
        &self,
        project_id: &str,
    ) -> Result<HashMap<String, LatestPhaseJobs>, DatabaseError> {
        let jobs = self.list_jobs(&JobFilter::for_project(project_id)).await?;

        let mut by_module: HashMap<String, LatestPhaseJobs> = HashMap::new();
        for job in jobs {
            let Some(module_id) = job.module_id.clone() else {
                continue;
            };
            let entry = by_module.entry(module_id).or_default();
            if let Some(slot) = entry.slot_mut(job.phase) {
                // Rows arrive latest first, so the first job per slot wins.
                if slot.is_none() {
                    *slot = Some(job);
                }
            }
        }
        Ok(by_module)
    }

    /// Apply a partial update inside one transaction.
    ///
    /// A status change must be allowed by [`JobStatus::can_transition_to`],
    /// and a job that already reached a terminal status accepts no further
    /// status at all, not even the same one. Moving into a terminal status
    /// stamps `finished_at` unless the update sets it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the job does not exist,
    /// `DatabaseError::InvalidState` for a forbidden transition or a
    /// repeated artifact id, or another `DatabaseError` if a statement fails
    /// (nothing is committed then).
    pub async fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job, DatabaseError> {
        if update.is_empty() {
            return self.get_job(id).await?.ok_or(DatabaseError::NoResult);
        }

        {
            let _guard = self.write_guard().await;
            let tx = self.db().conn().transaction().await?;
            let applied = apply_job_update(&tx, id, &update).await;
            match applied {
                Ok(_) => tx.commit().await?,
                Err(e) => {
                    tx.rollback().await?;
                    return Err(e);
                }
            }
        }

        if let Some(status) = update.status {
            tracing::debug!(job_id = id, %status, "job updated");
        }
        self.get_job(id).await?.ok_or(DatabaseError::NoResult)
    }

    /// Finish a job and apply module changes to its project atomically.
    ///
    /// The job update, its artifacts and every module creation and deletion
    /// commit together or not at all.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationStore::update_job`]; a duplicate module name is
    /// `InvalidState`.
    pub async fn complete_job(
        &self,
        id: &str,
        update: JobUpdate,
        modules: &ModuleChanges,
    ) -> Result<Job, DatabaseError> {
        let mut module_ids = Vec::with_capacity(modules.create.len());
        for _ in &modules.create {
            module_ids.push(self.db().generate_id(PREFIX_MODULE).await?);
        }

        {
            let _guard = self.write_guard().await;
            let tx = self.db().conn().transaction().await?;
            let applied = async {
                let project_id = apply_job_update(&tx, id, &update).await?;
                for (module_id, draft) in module_ids.iter().zip(&modules.create) {
                    insert_module(&tx, module_id, &project_id, &draft.name, &draft.source_path)
                        .await?;
                }
                for module_id in &modules.delete {
                    remove_module(&tx, &project_id, module_id).await?;
                }
                Ok::<_, DatabaseError>(project_id)
            }
            .await;

            match applied {
                Ok(project_id) => {
                    tx.commit().await?;
                    if !modules.is_empty() {
                        tracing::info!(
                            job_id = id,
                            project_id = %project_id,
                            created = modules.create.len(),
                            deleted = modules.delete.len(),
                            "modules synchronized with job completion"
                        );
                    }
                }
                Err(e) => {
                    tx.rollback().await?;
                    return Err(e);
                }
            }
        }

        self.get_job(id).await?.ok_or(DatabaseError::NoResult)
    }

    /// Delete a job and its artifacts. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a statement fails.
    pub async fn delete_job(&self, id: &str) -> Result<bool, DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.db().conn().transaction().await?;
        tx.execute("DELETE FROM artifacts WHERE job_id = ?1", [id])
            .await?;
        let deleted = tx.execute("DELETE FROM jobs WHERE id = ?1", [id]).await?;
        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Stored log of a job, if any was captured.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the job does not exist.
    pub async fn job_log(&self, id: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT log FROM jobs WHERE id = ?1", [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_opt_string(&row, 0)
    }

    /// Whether `token` is the callback token issued for job `id`.
    ///
    /// Unknown jobs never verify.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn verify_callback_token(&self, id: &str, token: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT callback_token FROM jobs WHERE id = ?1", [id])
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(false);
        };
        let stored = row.get::<String>(0)?;
        Ok(constant_time_eq(stored.as_bytes(), token.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use x2a_core::entities::NewArtifact;
    use x2a_core::enums::{ArtifactType, JobStatus, MigrationPhase};

    use super::JobFilter;
    use crate::error::DatabaseError;
    use crate::test_support::helpers::{seed_module, seed_project, test_store};
    use crate::updates::job::JobUpdateBuilder;
    use crate::updates::module::{ModuleChanges, ModuleDraft};

    fn plan(value: &str) -> NewArtifact {
        NewArtifact {
            id: None,
            artifact_type: ArtifactType::MigrationPlan,
            value: value.into(),
        }
    }

    #[tokio::test]
    async fn create_job_starts_pending_without_private_fields() {
        let store = test_store().await;
        let project = seed_project(&store).await;

        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "tok")
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.finished_at.is_none());

        let fetched = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched, job);
        let json = serde_json::to_string(&fetched).unwrap();
        assert!(!json.contains("tok"));
    }

    #[rstest]
    #[case(MigrationPhase::Init, true)]
    #[case(MigrationPhase::Analyze, false)]
    #[tokio::test]
    async fn module_presence_must_match_phase(#[case] phase: MigrationPhase, #[case] with_module: bool) {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let module = seed_module(&store, &project.id, "web").await;
        let module_id = with_module.then_some(module.id.as_str());

        let err = store
            .create_job(&project.id, module_id, phase, "tok")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)), "{err:?}");
    }

    #[tokio::test]
    async fn second_active_job_for_module_is_rejected() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let module = seed_module(&store, &project.id, "web").await;

        store
            .create_job(&project.id, Some(&module.id), MigrationPhase::Analyze, "a")
            .await
            .unwrap();
        let err = store
            .create_job(&project.id, Some(&module.id), MigrationPhase::Migrate, "b")
            .await
            .unwrap_err();
        assert!(
            matches!(err, DatabaseError::ActiveJobExists { ref module_id, .. } if module_id.as_deref() == Some(module.id.as_str())),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn terminal_job_frees_the_slot() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let first = store
            .create_job(&project.id, None, MigrationPhase::Init, "a")
            .await
            .unwrap();
        store
            .update_job(&first.id, JobUpdateBuilder::new().status(JobStatus::Error).build())
            .await
            .unwrap();

        store
            .create_job(&project.id, None, MigrationPhase::Init, "b")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn active_jobs_in_different_modules_coexist() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let web = seed_module(&store, &project.id, "web").await;
        let db = seed_module(&store, &project.id, "db").await;

        store
            .create_job(&project.id, None, MigrationPhase::Init, "i")
            .await
            .unwrap();
        for module in [&web, &db] {
            store
                .create_job(&project.id, Some(&module.id), MigrationPhase::Analyze, "t")
                .await
                .unwrap();
        }

        let active = store
            .list_jobs(&JobFilter::for_project(&project.id).active())
            .await
            .unwrap();
        assert_eq!(active.len(), 3);
    }

    #[tokio::test]
    async fn last_job_only_returns_most_recent() {
        let store = test_store().await;
        let project = seed_project(&store).await;

        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = store
                .create_job(&project.id, None, MigrationPhase::Init, "t")
                .await
                .unwrap();
            store
                .update_job(&job.id, JobUpdateBuilder::new().status(JobStatus::Error).build())
                .await
                .unwrap();
            ids.push(job.id);
        }

        let latest = store.latest_init_job(&project.id).await.unwrap().unwrap();
        assert_eq!(latest.id, ids[2]);

        let all = store
            .list_jobs(&JobFilter::for_project(&project.id).phase(MigrationPhase::Init))
            .await
            .unwrap();
        let listed: Vec<_> = all.into_iter().map(|j| j.id).rev().collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn update_to_terminal_stamps_finished_at_and_replaces_artifacts() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "t")
            .await
            .unwrap();

        store
            .update_job(&job.id, JobUpdateBuilder::new().artifacts(vec![plan("old")]).build())
            .await
            .unwrap();

        let updated = store
            .update_job(
                &job.id,
                JobUpdateBuilder::new()
                    .status(JobStatus::Success)
                    .log(Some("done".into()))
                    .telemetry(Some(serde_json::json!({"tokens": 42})))
                    .artifacts(vec![
                        NewArtifact {
                            id: Some("art-fixed".into()),
                            ..plan("new")
                        },
                        NewArtifact {
                            artifact_type: ArtifactType::ProjectMetadata,
                            ..plan("[]")
                        },
                    ])
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, JobStatus::Success);
        assert!(updated.finished_at.is_some());
        assert_eq!(updated.telemetry, Some(serde_json::json!({"tokens": 42})));
        let values: Vec<_> = updated.artifacts.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["new", "[]"]);
        assert_eq!(updated.artifacts[0].id, "art-fixed");
        assert!(updated.artifacts[1].id.starts_with("art-"));
        assert_eq!(store.job_log(&job.id).await.unwrap().as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn forbidden_transition_commits_nothing() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "t")
            .await
            .unwrap();
        store
            .update_job(&job.id, JobUpdateBuilder::new().status(JobStatus::Success).build())
            .await
            .unwrap();

        let err = store
            .update_job(
                &job.id,
                JobUpdateBuilder::new()
                    .status(JobStatus::Error)
                    .artifacts(vec![plan("x")])
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)), "{err:?}");

        let job = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert!(job.artifacts.is_empty());
    }

    #[rstest]
    #[case(JobStatus::Error)]
    #[case(JobStatus::Success)]
    #[tokio::test]
    async fn finished_job_accepts_no_further_status(#[case] replay: JobStatus) {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "t")
            .await
            .unwrap();
        let first = store
            .update_job(
                &job.id,
                JobUpdateBuilder::new()
                    .status(JobStatus::Error)
                    .artifacts(vec![plan("first")])
                    .build(),
            )
            .await
            .unwrap();

        let err = store
            .update_job(
                &job.id,
                JobUpdateBuilder::new()
                    .status(replay)
                    .artifacts(vec![plan("second")])
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)), "{err:?}");

        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Error);
        assert_eq!(stored.finished_at, first.finished_at);
        assert_eq!(stored.artifacts[0].value, "first");
    }

    #[tokio::test]
    async fn repeated_artifact_id_is_invalid_state() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "t")
            .await
            .unwrap();
        let twin = || NewArtifact {
            id: Some("art-twin".into()),
            ..plan("x")
        };

        let err = store
            .update_job(
                &job.id,
                JobUpdateBuilder::new()
                    .status(JobStatus::Success)
                    .artifacts(vec![twin(), twin()])
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)), "{err:?}");

        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert!(stored.artifacts.is_empty());
    }

    #[tokio::test]
    async fn complete_job_applies_module_changes() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let legacy = seed_module(&store, &project.id, "legacy").await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "t")
            .await
            .unwrap();

        let changes = ModuleChanges {
            create: vec![ModuleDraft {
                name: "nginx".into(),
                source_path: "cookbooks/nginx".into(),
            }],
            delete: vec![legacy.id],
        };
        let done = store
            .complete_job(
                &job.id,
                JobUpdateBuilder::new().status(JobStatus::Success).build(),
                &changes,
            )
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Success);

        let names: Vec<_> = store
            .list_modules(&project.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["nginx".to_string()]);
    }

    #[tokio::test]
    async fn complete_job_commits_nothing_when_a_module_write_fails() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "t")
            .await
            .unwrap();
        store
            .db()
            .conn()
            .execute(
                "CREATE TRIGGER reject_modules BEFORE INSERT ON modules
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END",
                (),
            )
            .await
            .unwrap();

        let changes = ModuleChanges {
            create: vec![ModuleDraft {
                name: "nginx".into(),
                source_path: "cookbooks/nginx".into(),
            }],
            delete: vec![],
        };
        let err = store
            .complete_job(
                &job.id,
                JobUpdateBuilder::new()
                    .status(JobStatus::Success)
                    .artifacts(vec![plan("[]")])
                    .build(),
                &changes,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::LibSql(_)), "{err:?}");

        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert!(stored.finished_at.is_none());
        assert!(stored.artifacts.is_empty());
        assert!(store.list_modules(&project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_job_is_no_result() {
        let store = test_store().await;
        let err = store
            .update_job("job-0000000000000000", JobUpdateBuilder::new().status(JobStatus::Running).build())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NoResult));
    }

    #[tokio::test]
    async fn callback_token_verification() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let job = store
            .create_job(&project.id, None, MigrationPhase::Init, "secret-token")
            .await
            .unwrap();

        assert!(store.verify_callback_token(&job.id, "secret-token").await.unwrap());
        assert!(!store.verify_callback_token(&job.id, "secret-tokem").await.unwrap());
        assert!(!store.verify_callback_token("job-missing", "secret-token").await.unwrap());
    }

    #[tokio::test]
    async fn latest_jobs_by_module_groups_by_phase() {
        let store = test_store().await;
        let project = seed_project(&store).await;
        let web = seed_module(&store, &project.id, "web").await;
        seed_module(&store, &project.id, "db").await;

        for phase in [MigrationPhase::Analyze, MigrationPhase::Analyze, MigrationPhase::Migrate] {
            let job = store
                .create_job(&project.id, Some(&web.id), phase, "t")
                .await
                .unwrap();
            store
                .update_job(&job.id, JobUpdateBuilder::new().status(JobStatus::Success).build())
                .await
                .unwrap();
        }

        let map = store.latest_jobs_by_module(&project.id).await.unwrap();
        assert_eq!(map.len(), 1);
        let web_jobs = &map[&web.id];
        assert!(web_jobs.analyze.is_some());
        assert!(web_jobs.migrate.is_some());
        assert!(web_jobs.publish.is_none());

        let single = store.latest_module_jobs(&project.id, &web.id).await.unwrap();
        assert_eq!(&single, web_jobs);
    }
}
