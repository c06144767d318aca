//! Module repository.

use x2a_core::entities::Module;
use x2a_core::ids::PREFIX_MODULE;

use crate::error::DatabaseError;
use crate::helpers::is_unique_violation;
use crate::service::MigrationStore;

const SELECT_COLS: &str = "id, name, source_path, project_id";

fn row_to_module(row: &libsql::Row) -> Result<Module, DatabaseError> {
    Ok(Module {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        source_path: row.get::<String>(2)?,
        project_id: row.get::<String>(3)?,
    })
}

/// Insert one module row, mapping a duplicate name to `InvalidState`.
pub(crate) async fn insert_module(
    conn: &libsql::Connection,
    id: &str,
    project_id: &str,
    name: &str,
    source_path: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO modules (id, project_id, name, source_path) VALUES (?1, ?2, ?3, ?4)",
        libsql::params![id, project_id, name, source_path],
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DatabaseError::InvalidState(format!(
                "module '{name}' already exists in project {project_id}"
            ))
        } else {
            DatabaseError::from(e)
        }
    })?;
    Ok(())
}

/// Delete a module with its jobs and their artifacts. Returns the number of
/// module rows removed.
pub(crate) async fn remove_module(
    conn: &libsql::Connection,
    project_id: &str,
    module_id: &str,
) -> Result<u64, DatabaseError> {
    conn.execute(
        "DELETE FROM artifacts WHERE job_id IN
           (SELECT j.id FROM jobs j JOIN modules m ON m.id = j.module_id
            WHERE m.id = ?1 AND m.project_id = ?2)",
        [module_id, project_id],
    )
    .await?;
    conn.execute(
        "DELETE FROM jobs WHERE module_id = ?1 AND project_id = ?2",
        [module_id, project_id],
    )
    .await?;
    Ok(conn
        .execute(
            "DELETE FROM modules WHERE id = ?1 AND project_id = ?2",
            [module_id, project_id],
        )
        .await?)
}

impl MigrationStore {
    /// Create a module under a project. Names are unique per project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` for a duplicate name, or another
    /// `DatabaseError` if the insert fails.
    pub async fn create_module(
        &self,
        project_id: &str,
        name: &str,
        source_path: &str,
    ) -> Result<Module, DatabaseError> {
        let id = self.db().generate_id(PREFIX_MODULE).await?;

        let _guard = self.write_guard().await;
        insert_module(self.db().conn(), &id, project_id, name, source_path).await?;

        Ok(Module {
            id,
            name: name.to_string(),
            source_path: source_path.to_string(),
            project_id: project_id.to_string(),
        })
    }

    /// Fetch a module, only if it belongs to `project_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_module(
        &self,
        project_id: &str,
        module_id: &str,
    ) -> Result<Option<Module>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM modules WHERE id = ?1 AND project_id = ?2"),
                [module_id, project_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_module(&row)?)),
            None => Ok(None),
        }
    }

    /// List a project's modules ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_modules(&self, project_id: &str) -> Result<Vec<Module>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM modules WHERE project_id = ?1 ORDER BY name"),
                [project_id],
            )
            .await?;
        let mut modules = Vec::new();
        while let Some(row) = rows.next().await? {
            modules.push(row_to_module(&row)?);
        }
        Ok(modules)
    }

    /// Delete a module with its jobs and their artifacts.
    ///
    /// Returns `false` if the module does not exist in this project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any statement fails; nothing is deleted then.
    pub async fn delete_module(
        &self,
        project_id: &str,
        module_id: &str,
    ) -> Result<bool, DatabaseError> {
        let _guard = self.write_guard().await;
        let tx = self.db().conn().transaction().await?;
        let deleted = remove_module(&tx, project_id, module_id).await?;
        tx.commit().await?;

        if deleted > 0 {
            tracing::info!(project_id, module_id, "module deleted");
        }
        Ok(deleted > 0)
    }
}
