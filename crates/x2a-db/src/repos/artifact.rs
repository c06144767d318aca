//! Artifact repository. Artifacts have no lifecycle of their own: they are
//! written through job updates and read alongside their job.

use x2a_core::entities::{Artifact, NewArtifact};
use x2a_core::ids::{ID_HEX_LEN, PREFIX_ARTIFACT, random_hex};

use crate::error::DatabaseError;
use crate::helpers::{is_unique_violation, parse_enum};
use crate::service::MigrationStore;

fn row_to_artifact(row: &libsql::Row) -> Result<Artifact, DatabaseError> {
    Ok(Artifact {
        id: row.get::<String>(0)?,
        artifact_type: parse_enum(&row.get::<String>(1)?)?,
        value: row.get::<String>(2)?,
    })
}

/// Replace every artifact of `job_id` with `artifacts`, preserving order.
///
/// Runs on whatever connection or transaction the caller holds. A repeated
/// artifact id is `InvalidState`.
pub(crate) async fn replace_artifacts(
    conn: &libsql::Connection,
    job_id: &str,
    artifacts: &[NewArtifact],
) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM artifacts WHERE job_id = ?1", [job_id])
        .await?;

    for (position, artifact) in artifacts.iter().enumerate() {
        let id = match &artifact.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!(
                "{PREFIX_ARTIFACT}-{}",
                random_hex(ID_HEX_LEN / 2).map_err(|e| DatabaseError::Other(e.into()))?
            ),
        };
        let position = i64::try_from(position).map_err(|e| DatabaseError::Other(e.into()))?;
        conn.execute(
            "INSERT INTO artifacts (job_id, id, position, type, value) VALUES (?1, ?2, ?3, ?4, ?5)",
            libsql::params![
                job_id,
                id.as_str(),
                position,
                artifact.artifact_type.as_str(),
                artifact.value.as_str()
            ],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::InvalidState(format!("duplicate artifact id '{id}'"))
            } else {
                DatabaseError::from(e)
            }
        })?;
    }
    Ok(())
}

impl MigrationStore {
    /// Artifacts of a job in the order they were reported.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_artifacts(&self, job_id: &str) -> Result<Vec<Artifact>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, type, value FROM artifacts WHERE job_id = ?1 ORDER BY position",
                [job_id],
            )
            .await?;
        let mut artifacts = Vec::new();
        while let Some(row) = rows.next().await? {
            artifacts.push(row_to_artifact(&row)?);
        }
        Ok(artifacts)
    }
}
