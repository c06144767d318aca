//! Shared test utilities for x2a-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use x2a_core::entities::{Module, NewProject, Project};

    use crate::service::MigrationStore;

    /// In-memory store with migrations applied.
    pub async fn test_store() -> MigrationStore {
        MigrationStore::open_local(":memory:").await.unwrap()
    }

    pub fn new_project(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            abbreviation: name.to_lowercase(),
            description: String::new(),
            source_repo_url: "https://github.com/acme/chef-repo".into(),
            source_repo_branch: "main".into(),
            target_repo_url: "https://github.com/acme/ansible-repo".into(),
            target_repo_branch: "main".into(),
        }
    }

    /// Create a project owned by a fixed test user.
    pub async fn seed_project(store: &MigrationStore) -> Project {
        store
            .create_project(&new_project("Infra"), "user:default/tester")
            .await
            .unwrap()
    }

    pub async fn seed_module(store: &MigrationStore, project_id: &str, name: &str) -> Module {
        store
            .create_module(project_id, name, &format!("cookbooks/{name}"))
            .await
            .unwrap()
    }
}
