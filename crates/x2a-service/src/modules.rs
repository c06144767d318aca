//! Module reads and writes, job listings, and the module sync driven by
//! `init` metadata.

use std::collections::{BTreeMap, HashMap};

use x2a_core::entities::{Job, Module, ModuleMetadataEntry};
use x2a_core::enums::MigrationPhase;
use x2a_core::identity::CallerIdentity;
use x2a_core::responses::{LatestPhaseJobs, ModuleView};
use x2a_core::status::module_status;
use x2a_db::repos::job::JobFilter;
use x2a_db::updates::module::{ModuleChanges, ModuleDraft};

use crate::error::OrchestrationError;
use crate::orchestrator::Orchestrator;
use crate::requests::CreateModuleRequest;

fn module_view(module: Module, jobs: LatestPhaseJobs) -> ModuleView {
    let status = module_status(&jobs);
    ModuleView {
        module,
        status: status.status,
        error_details: status.error_details,
        jobs,
    }
}

/// Difference between the stored modules and reported metadata.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ModuleSyncPlan {
    /// Entries with no module of the same name.
    pub create: Vec<ModuleMetadataEntry>,
    /// Stored modules whose name no entry carries.
    pub delete: Vec<Module>,
}

impl ModuleSyncPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }

    /// The store writes that carry out this plan.
    #[must_use]
    pub fn changes(&self) -> ModuleChanges {
        ModuleChanges {
            create: self
                .create
                .iter()
                .map(|entry| ModuleDraft {
                    name: entry.name.clone(),
                    source_path: entry.path.clone(),
                })
                .collect(),
            delete: self.delete.iter().map(|m| m.id.clone()).collect(),
        }
    }
}

/// Diff modules against metadata by name. Matching modules are left alone
/// even when the reported path differs; duplicate entries collapse to the
/// first one.
#[must_use]
pub fn plan_module_sync(existing: &[Module], entries: &[ModuleMetadataEntry]) -> ModuleSyncPlan {
    let mut reported: BTreeMap<&str, &ModuleMetadataEntry> = BTreeMap::new();
    for entry in entries {
        reported.entry(entry.name.as_str()).or_insert(entry);
    }

    let create = reported
        .values()
        .filter(|entry| !existing.iter().any(|m| m.name == entry.name))
        .map(|entry| (*entry).clone())
        .collect();
    let delete = existing
        .iter()
        .filter(|m| !reported.contains_key(m.name.as_str()))
        .cloned()
        .collect();
    ModuleSyncPlan { create, delete }
}

impl Orchestrator {
    /// Modules of a readable project with their derived status.
    ///
    /// # Errors
    ///
    /// `NotFound` when the project is not readable by the caller.
    pub async fn list_modules(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
    ) -> Result<Vec<ModuleView>, OrchestrationError> {
        self.project_in_scope(project_id, &caller.read_scope()).await?;
        self.module_views(project_id).await
    }

    /// # Errors
    ///
    /// `NotFound` when the project is not readable or the module is absent.
    pub async fn get_module(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        module_id: &str,
    ) -> Result<ModuleView, OrchestrationError> {
        self.project_in_scope(project_id, &caller.read_scope()).await?;
        let module = self.module_of(project_id, module_id).await?;
        let jobs = self.store().latest_module_jobs(project_id, module_id).await?;
        Ok(module_view(module, jobs))
    }

    /// # Errors
    ///
    /// `NotFound` when the project is not writable, `Input` for blank fields
    /// or a name already used in the project.
    pub async fn create_module(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        request: &CreateModuleRequest,
    ) -> Result<Module, OrchestrationError> {
        if request.name.trim().is_empty() {
            return Err(OrchestrationError::Input("name is required".to_string()));
        }
        if request.source_path.trim().is_empty() {
            return Err(OrchestrationError::Input("sourcePath is required".to_string()));
        }
        self.project_in_scope(project_id, &caller.write_scope()).await?;
        self.store()
            .create_module(project_id, &request.name, &request.source_path)
            .await
            .map_err(|e| match e {
                x2a_db::error::DatabaseError::InvalidState(message) => {
                    OrchestrationError::Input(message)
                }
                other => other.into(),
            })
    }

    /// # Errors
    ///
    /// `NotFound` when the project is not writable or the module is absent.
    pub async fn delete_module(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        module_id: &str,
    ) -> Result<(), OrchestrationError> {
        self.project_in_scope(project_id, &caller.write_scope()).await?;
        if self.store().delete_module(project_id, module_id).await? {
            tracing::info!(project_id, module_id, "module deleted");
            Ok(())
        } else {
            Err(OrchestrationError::module_not_found(module_id))
        }
    }

    /// Jobs of a readable project, newest first, optionally narrowed to one
    /// module and phase.
    ///
    /// # Errors
    ///
    /// `NotFound` when the project is not readable or the module is absent.
    pub async fn list_jobs(
        &self,
        caller: &CallerIdentity,
        project_id: &str,
        module_id: Option<&str>,
        phase: Option<MigrationPhase>,
    ) -> Result<Vec<Job>, OrchestrationError> {
        self.project_in_scope(project_id, &caller.read_scope()).await?;
        let mut filter = JobFilter::for_project(project_id);
        if let Some(module_id) = module_id {
            self.module_of(project_id, module_id).await?;
            filter = filter.module(module_id);
        }
        if let Some(phase) = phase {
            filter = filter.phase(phase);
        }
        Ok(self.store().list_jobs(&filter).await?)
    }

    pub(crate) async fn module_views(
        &self,
        project_id: &str,
    ) -> Result<Vec<ModuleView>, OrchestrationError> {
        let modules = self.store().list_modules(project_id).await?;
        let mut latest: HashMap<String, LatestPhaseJobs> =
            self.store().latest_jobs_by_module(project_id).await?;
        Ok(modules
            .into_iter()
            .map(|module| {
                let jobs = latest.remove(&module.id).unwrap_or_default();
                module_view(module, jobs)
            })
            .collect())
    }

    /// Plan how a project's modules follow the `project_metadata` reported
    /// by a successful `init` job. Nothing is written here; the plan is
    /// committed with the job completion. Malformed metadata is logged and
    /// yields an empty plan.
    ///
    /// # Errors
    ///
    /// Propagates store failures while reading the current modules.
    pub(crate) async fn plan_sync_from_metadata(
        &self,
        project_id: &str,
        metadata: &str,
    ) -> Result<ModuleSyncPlan, OrchestrationError> {
        let entries: Vec<ModuleMetadataEntry> = match serde_json::from_str(metadata) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(project_id, error = %e, "malformed project metadata, module sync skipped");
                return Ok(ModuleSyncPlan::default());
            }
        };

        let existing = self.store().list_modules(project_id).await?;
        Ok(plan_module_sync(&existing, &entries))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{Harness, owner, stranger};

    fn module(name: &str, path: &str) -> Module {
        Module {
            id: format!("mod-{name}"),
            name: name.into(),
            source_path: path.into(),
            project_id: "prj-1".into(),
        }
    }

    fn entry(name: &str, path: &str) -> ModuleMetadataEntry {
        ModuleMetadataEntry {
            name: name.into(),
            path: path.into(),
        }
    }

    #[test]
    fn plan_creates_and_deletes_by_name() {
        let existing = [module("nginx", "cookbooks/nginx"), module("legacy", "cookbooks/legacy")];
        let entries = [
            entry("nginx", "cookbooks/nginx-moved"),
            entry("mysql", "cookbooks/mysql"),
        ];
        let plan = plan_module_sync(&existing, &entries);
        assert_eq!(plan.create, vec![entry("mysql", "cookbooks/mysql")]);
        assert_eq!(plan.delete, vec![module("legacy", "cookbooks/legacy")]);
    }

    #[test]
    fn plan_is_empty_when_names_match() {
        let existing = [module("nginx", "cookbooks/nginx")];
        let plan = plan_module_sync(&existing, &[entry("nginx", "cookbooks/nginx")]);
        assert!(plan.is_empty());
    }

    #[test]
    fn duplicate_entries_create_once() {
        let plan = plan_module_sync(&[], &[entry("a", "x"), entry("a", "y")]);
        assert_eq!(plan.create, vec![entry("a", "x")]);
    }

    #[tokio::test]
    async fn metadata_plan_reads_without_writing() {
        let h = Harness::new().await;
        let project = h.project().await;
        h.module(&project.id, "nginx").await;
        let legacy = h.module(&project.id, "legacy").await;

        let plan = h
            .orch
            .plan_sync_from_metadata(
                &project.id,
                r#"[{"name":"nginx","path":"cookbooks/nginx"},{"name":"mysql","path":"cookbooks/mysql"}]"#,
            )
            .await
            .unwrap();
        assert_eq!(
            plan.changes(),
            ModuleChanges {
                create: vec![ModuleDraft {
                    name: "mysql".into(),
                    source_path: "cookbooks/mysql".into(),
                }],
                delete: vec![legacy.id],
            }
        );
        assert_eq!(h.store.list_modules(&project.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_metadata_plans_nothing() {
        let h = Harness::new().await;
        let project = h.project().await;
        h.module(&project.id, "nginx").await;

        let plan = h
            .orch
            .plan_sync_from_metadata(&project.id, "{not json")
            .await
            .unwrap();
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn fresh_module_is_pending() {
        let h = Harness::new().await;
        let project = h.project().await;
        let module = h.module(&project.id, "nginx").await;

        let view = h.orch.get_module(&owner(), &project.id, &module.id).await.unwrap();
        assert_eq!(view.status, x2a_core::enums::JobStatus::Pending);
        assert_eq!(view.jobs, LatestPhaseJobs::default());
    }

    #[tokio::test]
    async fn duplicate_module_name_is_input_error() {
        let h = Harness::new().await;
        let project = h.project().await;
        let request = CreateModuleRequest {
            name: "nginx".into(),
            source_path: "cookbooks/nginx".into(),
        };
        h.orch.create_module(&owner(), &project.id, &request).await.unwrap();
        let err = h
            .orch
            .create_module(&owner(), &project.id, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Input(_)));
    }

    #[tokio::test]
    async fn strangers_cannot_touch_modules() {
        let h = Harness::new().await;
        let project = h.project().await;
        let module = h.module(&project.id, "nginx").await;

        let err = h
            .orch
            .delete_module(&stranger(), &project.id, &module.id)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::NotFound(_)));
        assert!(h.orch.list_modules(&stranger(), &project.id).await.is_err());
    }
}
