//! Orchestrator wired to an in-memory store and cluster.

use std::sync::Arc;

use x2a_config::{AapConfig, KubernetesConfig, LlmConfig};
use x2a_core::entities::{Job, Module, NewProject, Project};
use x2a_core::enums::MigrationPhase;
use x2a_core::identity::CallerIdentity;
use x2a_core::responses::RunResponse;
use x2a_db::service::MigrationStore;
use x2a_k8s::builder::{ResourceSpecBuilder, job_secret_name};
use x2a_k8s::credentials::RepoAuth;
use x2a_k8s::memory::InMemoryCluster;

use crate::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::requests::RunRequest;

pub const OWNER: &str = "user:default/owner";
/// Callback token of jobs reserved through [`Harness::reserved_job`].
pub const TOKEN: &str = "test-callback-token";

pub fn owner() -> CallerIdentity {
    CallerIdentity {
        user_ref: OWNER.to_string(),
        can_view_all: false,
        can_write_all: false,
    }
}

pub fn stranger() -> CallerIdentity {
    CallerIdentity {
        user_ref: "user:default/stranger".to_string(),
        can_view_all: false,
        can_write_all: false,
    }
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

pub fn run_request(phase: Option<MigrationPhase>) -> RunRequest {
    RunRequest {
        phase,
        source_repo_auth: Some(RepoAuth {
            token: "ghp_source".into(),
        }),
        target_repo_auth: Some(RepoAuth {
            token: "ghp_target".into(),
        }),
        aap_credentials: None,
        user_prompt: None,
    }
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        llm: LlmConfig {
            model: "anthropic.claude".into(),
            region: "us-east-1".into(),
            access_key_id: "AKIA".into(),
            secret_access_key: "secret".into(),
            ..LlmConfig::default()
        },
        aap: AapConfig {
            controller_url: "https://aap.example.com".into(),
            org_name: "acme".into(),
            oauth_token: "aap-token".into(),
            ..AapConfig::default()
        },
        require_callback_token: true,
    }
}

pub struct Harness {
    pub store: Arc<MigrationStore>,
    pub cluster: Arc<InMemoryCluster>,
    pub orch: Orchestrator,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MigrationStore::open_local(":memory:").await.unwrap());
        let cluster = Arc::new(InMemoryCluster::new());
        let builder = ResourceSpecBuilder::new(
            KubernetesConfig {
                namespace: "x2a".into(),
                image: "quay.io/x2a/convertor".into(),
                ..KubernetesConfig::default()
            },
            "http://x2a.test/api/x2a",
        );
        let orch = Orchestrator::new(store.clone(), cluster.clone(), builder, settings());
        Self {
            store,
            cluster,
            orch,
        }
    }

    pub async fn project(&self) -> Project {
        self.store
            .create_project(&new_project("Infra"), OWNER)
            .await
            .unwrap()
    }

    pub async fn module(&self, project_id: &str, name: &str) -> Module {
        self.store
            .create_module(project_id, name, &format!("cookbooks/{name}"))
            .await
            .unwrap()
    }

    /// A job row with no cluster Job behind it.
    pub async fn reserved_job(
        &self,
        project_id: &str,
        module_id: Option<&str>,
        phase: MigrationPhase,
    ) -> Job {
        self.store
            .create_job(project_id, module_id, phase, TOKEN)
            .await
            .unwrap()
    }

    pub async fn run_init(&self, project_id: &str) -> RunResponse {
        self.orch
            .run_project_init(&owner(), project_id, &run_request(None))
            .await
            .unwrap()
    }

    /// The callback token handed to a submitted job through its Secret.
    pub fn callback_token(&self, job_id: &str) -> String {
        self.cluster
            .secret(&job_secret_name(job_id))
            .and_then(|s| s.decoded("CALLBACK_TOKEN"))
            .unwrap()
    }
}
