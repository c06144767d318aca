//! Project repository: create, scoped get/list, cascading delete.

use chrono::Utc;

use x2a_core::entities::{NewProject, Project};
use x2a_core::identity::AccessScope;
use x2a_core::ids::PREFIX_PROJECT;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, timestamp};
use crate::repos::scope_filter_sql;
use crate::service::MigrationStore;

const SELECT_COLS: &str = "id, name, abbreviation, description, source_repo_url, source_repo_branch, \
     target_repo_url, target_repo_branch, created_by, created_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        abbreviation: row.get::<String>(2)?,
        description: row.get::<String>(3)?,
        source_repo_url: row.get::<String>(4)?,
        source_repo_branch: row.get::<String>(5)?,
        target_repo_url: row.get::<String>(6)?,
        target_repo_branch: row.get::<String>(7)?,
        created_by: row.get::<String>(8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl MigrationStore {
    /// Register a project owned by `created_by`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn create_project(
        &self,
        new: &NewProject,
        created_by: &str,
    ) -> Result<Project, DatabaseError> {
        let id = self.db().generate_id(PREFIX_PROJECT).await?;
        let created_at = timestamp(Utc::now());

        let _guard = self.write_guard().await;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                libsql::params![
                    id.as_str(),
                    new.name.as_str(),
                    new.abbreviation.as_str(),
                    new.description.as_str(),
                    new.source_repo_url.as_str(),
                    new.source_repo_branch.as_str(),
                    new.target_repo_url.as_str(),
                    new.target_repo_branch.as_str(),
                    created_by,
                    created_at.as_str()
                ],
            )
            .await?;

        Ok(Project {
            id,
            name: new.name.clone(),
            abbreviation: new.abbreviation.clone(),
            description: new.description.clone(),
            source_repo_url: new.source_repo_url.clone(),
            source_repo_branch: new.source_repo_branch.clone(),
            target_repo_url: new.target_repo_url.clone(),
            target_repo_branch: new.target_repo_branch.clone(),
            created_by: created_by.to_string(),
            created_at: parse_datetime(&created_at)?,
        })
    }

    /// Fetch a project visible within `scope`.
    ///
    /// Returns `None` both when the row is absent and when it belongs to
    /// someone else.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_project(
        &self,
        id: &str,
        scope: &AccessScope,
    ) -> Result<Option<Project>, DatabaseError> {
        let (scope_sql, scope_params) = scope_filter_sql(scope, "created_by", 2);
        let sql = format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1 {scope_sql}");
        let mut params: Vec<libsql::Value> = vec![id.into()];
        params.extend(scope_params);

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    /// List projects visible within `scope`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_projects(&self, scope: &AccessScope) -> Result<Vec<Project>, DatabaseError> {
        let (scope_sql, scope_params) = scope_filter_sql(scope, "created_by", 1);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM projects WHERE 1=1 {scope_sql} ORDER BY created_at DESC, rowid DESC"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(scope_params))
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// Delete a project with its modules, jobs, and artifacts.
    ///
    /// Returns `false` if no project with this id is visible within `scope`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any statement fails; nothing is deleted then.
    pub async fn delete_project(
        &self,
        id: &str,
        scope: &AccessScope,
    ) -> Result<bool, DatabaseError> {
        let (scope_sql, scope_params) = scope_filter_sql(scope, "created_by", 2);
        let mut params: Vec<libsql::Value> = vec![id.into()];
        params.extend(scope_params);

        let _guard = self.write_guard().await;
        let tx = self.db().conn().transaction().await?;

        let mut rows = tx
            .query(
                &format!("SELECT 1 FROM projects WHERE id = ?1 {scope_sql}"),
                libsql::params_from_iter(params),
            )
            .await?;
        if rows.next().await?.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }
        drop(rows);

        tx.execute(
            "DELETE FROM artifacts WHERE job_id IN (SELECT id FROM jobs WHERE project_id = ?1)",
            [id],
        )
        .await?;
        tx.execute("DELETE FROM jobs WHERE project_id = ?1", [id])
            .await?;
        tx.execute("DELETE FROM modules WHERE project_id = ?1", [id])
            .await?;
        tx.execute("DELETE FROM projects WHERE id = ?1", [id])
            .await?;
        tx.commit().await?;

        tracing::info!(project_id = id, "project deleted");
        Ok(true)
    }
}
