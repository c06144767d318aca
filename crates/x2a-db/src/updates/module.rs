//! Module changes applied alongside a job completion.

/// A module to create, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDraft {
    pub name: String,
    pub source_path: String,
}

/// Creations and deletions committed together with the job update in
/// [`crate::service::MigrationStore::complete_job`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleChanges {
    pub create: Vec<ModuleDraft>,
    /// Module ids; their jobs and artifacts go with them.
    pub delete: Vec<String>,
}

impl ModuleChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}
