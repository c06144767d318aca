//! Project CRUD with derived status on every read.

use x2a_core::entities::{NewProject, Project};
use x2a_core::identity::CallerIdentity;
use x2a_core::responses::ProjectView;
use x2a_core::status::project_status;
use x2a_k8s::builder::project_secret_name;

use crate::error::OrchestrationError;
use crate::orchestrator::Orchestrator;

fn validate_new_project(new: &NewProject) -> Result<(), OrchestrationError> {
    let required = [
        ("name", &new.name),
        ("abbreviation", &new.abbreviation),
        ("sourceRepoUrl", &new.source_repo_url),
        ("sourceRepoBranch", &new.source_repo_branch),
        ("targetRepoUrl", &new.target_repo_url),
        ("targetRepoBranch", &new.target_repo_branch),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(OrchestrationError::Input(format!("{field} is required")));
        }
    }
    Ok(())
}

impl Orchestrator {
    /// Create a project owned by the caller.
    ///
    /// # Errors
    ///
    /// `Input` when a required field is blank.
    pub async fn create_project(
        &self,
        caller: &CallerIdentity,
        new: &NewProject,
    ) -> Result<ProjectView, OrchestrationError> {
        validate_new_project(new)?;
        let project = self.store().create_project(new, &caller.user_ref).await?;
        tracing::info!(project_id = %project.id, created_by = %caller.user_ref, "project created");
        self.project_view(project).await
    }

    /// Projects visible to the caller, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_projects(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<ProjectView>, OrchestrationError> {
        let projects = self.store().list_projects(&caller.read_scope()).await?;
        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            views.push(self.project_view(project).await?);
        }
        Ok(views)
    }

    /// # Errors
    ///
    /// `NotFound` when the project is absent or outside the caller's read scope.
    pub async fn get_project(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
    ) -> Result<ProjectView, OrchestrationError> {
        let project = self.project_in_scope(project_id, &caller.read_scope()).await?;
        self.project_view(project).await
    }

    /// Delete a project with its modules, jobs, and artifacts, then drop its
    /// credentials Secret.
    ///
    /// # Errors
    ///
    /// `NotFound` when the project is absent or outside the caller's write scope.
    pub async fn delete_project(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
    ) -> Result<(), OrchestrationError> {
        if !self
            .store()
            .delete_project(project_id, &caller.write_scope())
            .await?
        {
            return Err(OrchestrationError::project_not_found(project_id));
        }

        let secret = project_secret_name(project_id);
        if let Err(e) = self.cluster().delete_secret(&secret).await {
            tracing::warn!(project_id, %secret, error = %e, "failed to delete project secret");
        }
        Ok(())
    }

    pub(crate) async fn project_view(
        &self,
        project: Project,
    ) -> Result<ProjectView, OrchestrationError> {
        let init_job = self.store().latest_init_job(&project.id).await?;
        let modules = self.module_views(&project.id).await?;
        let status = project_status(init_job.as_ref(), &modules);
        Ok(ProjectView {
            project,
            status,
            init_job,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use x2a_core::enums::ProjectState;
    use x2a_core::responses::ModulesSummary;

    use super::*;
    use crate::test_support::{Harness, new_project, owner, stranger};

    #[tokio::test]
    async fn create_then_read_back_as_created() {
        let h = Harness::new().await;
        let created = h.orch.create_project(&owner(), &new_project("alpha")).await.unwrap();
        assert_eq!(created.status.state, ProjectState::Created);
        assert_eq!(created.status.modules_summary, ModulesSummary::default());
        assert!(created.init_job.is_none());

        let fetched = h.orch.get_project(&owner(), &created.project.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let h = Harness::new().await;
        let mut new = new_project("alpha");
        new.target_repo_branch = "  ".into();
        let err = h.orch.create_project(&owner(), &new).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Input(ref m) if m == "targetRepoBranch is required"));
    }

    #[tokio::test]
    async fn other_users_see_not_found() {
        let h = Harness::new().await;
        let created = h.orch.create_project(&owner(), &new_project("alpha")).await.unwrap();

        assert!(h.orch.list_projects(&stranger()).await.unwrap().is_empty());
        let err = h.orch.get_project(&stranger(), &created.project.id).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::NotFound(_)));
        let err = h
            .orch
            .delete_project(&stranger(), &created.project.id)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_project() {
        let h = Harness::new().await;
        let created = h.orch.create_project(&owner(), &new_project("alpha")).await.unwrap();
        h.orch.delete_project(&owner(), &created.project.id).await.unwrap();
        assert!(h.orch.list_projects(&owner()).await.unwrap().is_empty());
    }
}
