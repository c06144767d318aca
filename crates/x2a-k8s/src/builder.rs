//! Builds the Secrets and the Job that execute one migration phase.
//!
//! Everything here is a pure function of its inputs and the configuration
//! captured at construction. Two Secrets back every Job: a long-lived project
//! Secret with LLM and AAP credentials, and a per-job Secret with git
//! credentials and the callback token.

use std::collections::BTreeMap;

use x2a_config::{KubernetesConfig, LlmConfig};
use x2a_core::entities::{Module, Project};
use x2a_core::enums::MigrationPhase;
use x2a_core::ids::random_hex;

use crate::command::{CommandArgs, SOURCE_DIR, TARGET_DIR, build_command};
use crate::credentials::{RepoAuth, ResolvedAap, project_secret_entries};
use crate::error::SpecError;
use crate::labels::sanitize_label_value;
use crate::manifest::{
    Container, EmptyDir, EnvFromSource, EnvVar, Job, JobSpec, ObjectMeta, PodSpec,
    PodTemplateSpec, ResourceRequirements, Secret, Volume, VolumeMount,
};

const INIT_SCRIPT: &str = include_str!("../resources/init-repos.sh");

pub const BACKOFF_LIMIT: i32 = 3;
const WORKSPACE_VOLUME: &str = "workspace";
const WORKSPACE_PATH: &str = "/workspace";

pub const LABEL_APP: &str = "app.kubernetes.io/name";
pub const LABEL_PROJECT: &str = "x2a.io/project-id";
pub const LABEL_JOB: &str = "x2a.io/job-id";
pub const LABEL_PHASE: &str = "x2a.io/phase";
pub const LABEL_MODULE: &str = "x2a.io/module";
const APP_NAME: &str = "x2a";

/// Name of the long-lived Secret of a project.
#[must_use]
pub fn project_secret_name(project_id: &str) -> String {
    format!("x2a-project-{project_id}")
}

/// Name of the per-job git credentials Secret.
#[must_use]
pub fn job_secret_name(job_id: &str) -> String {
    format!("x2a-job-{job_id}")
}

/// Label selector matching every Job of a project.
#[must_use]
pub fn project_selector(project_id: &str) -> String {
    format!("{LABEL_APP}={APP_NAME},{LABEL_PROJECT}={}", sanitize_label_value(project_id))
}

/// Everything needed to build one phase run.
#[derive(Debug, Clone, Copy)]
pub struct JobRequest<'a> {
    pub job_id: &'a str,
    pub phase: MigrationPhase,
    pub project: &'a Project,
    pub module: Option<&'a Module>,
    pub user_prompt: Option<&'a str>,
}

/// Turns run requests into Kubernetes manifests.
#[derive(Debug, Clone)]
pub struct ResourceSpecBuilder {
    kubernetes: KubernetesConfig,
    /// Externally reachable API base, e.g. `https://x2a.example.com/api/x2a`.
    callback_base_url: String,
}

impl ResourceSpecBuilder {
    #[must_use]
    pub fn new(kubernetes: KubernetesConfig, callback_base_url: impl Into<String>) -> Self {
        Self {
            kubernetes,
            callback_base_url: callback_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.kubernetes.namespace
    }

    fn meta(&self, name: String, labels: BTreeMap<String, String>) -> ObjectMeta {
        ObjectMeta {
            name,
            namespace: self.kubernetes.namespace.clone(),
            labels,
            ..ObjectMeta::default()
        }
    }

    fn project_labels(project_id: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_APP.to_string(), APP_NAME.to_string()),
            (LABEL_PROJECT.to_string(), sanitize_label_value(project_id)),
        ])
    }

    /// The project Secret with LLM and AAP credentials.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::Credentials` if the LLM configuration is invalid.
    pub fn project_secret(
        &self,
        project_id: &str,
        llm: &LlmConfig,
        aap: &ResolvedAap,
    ) -> Result<Secret, SpecError> {
        let entries = project_secret_entries(llm, aap)?;
        Ok(Secret::opaque(
            self.meta(project_secret_name(project_id), Self::project_labels(project_id)),
            &entries,
        ))
    }

    /// The per-job Secret with git credentials and the callback token.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::InvalidInput` if a repository token is empty.
    pub fn job_secret(
        &self,
        job_id: &str,
        project: &Project,
        source_auth: &RepoAuth,
        target_auth: &RepoAuth,
        callback_token: &str,
    ) -> Result<Secret, SpecError> {
        for (which, auth) in [("sourceRepoAuth", source_auth), ("targetRepoAuth", target_auth)] {
            if auth.token.trim().is_empty() {
                return Err(SpecError::InvalidInput(format!("{which}.token is required")));
            }
        }

        let entries = BTreeMap::from([
            ("SOURCE_REPO_URL".to_string(), project.source_repo_url.clone()),
            ("SOURCE_REPO_BRANCH".to_string(), project.source_repo_branch.clone()),
            ("SOURCE_REPO_TOKEN".to_string(), source_auth.token.clone()),
            ("TARGET_REPO_URL".to_string(), project.target_repo_url.clone()),
            ("TARGET_REPO_BRANCH".to_string(), project.target_repo_branch.clone()),
            ("TARGET_REPO_TOKEN".to_string(), target_auth.token.clone()),
            ("CALLBACK_TOKEN".to_string(), callback_token.to_string()),
        ]);

        let mut labels = Self::project_labels(&project.id);
        labels.insert(LABEL_JOB.to_string(), sanitize_label_value(job_id));
        Ok(Secret::opaque(self.meta(job_secret_name(job_id), labels), &entries))
    }

    /// URL the job POSTs its outcome to.
    #[must_use]
    pub fn callback_url(&self, project_id: &str, phase: MigrationPhase, module_id: Option<&str>) -> String {
        let mut url = format!(
            "{}/projects/{}/collectArtifacts?phase={phase}",
            self.callback_base_url,
            urlencoding::encode(project_id)
        );
        if let Some(module_id) = module_id {
            url.push_str("&moduleId=");
            url.push_str(&urlencoding::encode(module_id));
        }
        url
    }

    /// The Job running one phase, with a freshly generated name.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::MissingModuleName` for a module phase without a
    /// module, or `SpecError::Random` if no job name can be generated.
    pub fn job(&self, request: &JobRequest<'_>) -> Result<Job, SpecError> {
        let module_name = request.module.map(|m| m.name.as_str());
        let command = build_command(
            &self.kubernetes.command,
            &CommandArgs {
                phase: request.phase,
                project_abbreviation: &request.project.abbreviation,
                module_name,
                user_prompt: request.user_prompt,
                source_technology: &self.kubernetes.source_technology,
            },
        )?;

        let suffix = random_hex(4).map_err(|e| SpecError::Random(e.to_string()))?;
        let name = format!("job-x2a-{}-{suffix}", request.phase);

        let mut labels = Self::project_labels(&request.project.id);
        labels.insert(LABEL_JOB.to_string(), sanitize_label_value(request.job_id));
        labels.insert(LABEL_PHASE.to_string(), request.phase.as_str().to_string());
        if let Some(module_name) = module_name {
            labels.insert(LABEL_MODULE.to_string(), sanitize_label_value(module_name));
        }

        let project_secret = project_secret_name(&request.project.id);
        let job_secret = job_secret_name(request.job_id);
        let workspace_mount = VolumeMount {
            name: WORKSPACE_VOLUME.to_string(),
            mount_path: WORKSPACE_PATH.to_string(),
        };
        let dirs = [EnvVar::new("SOURCE_DIR", SOURCE_DIR), EnvVar::new("TARGET_DIR", TARGET_DIR)];

        let init_container = Container {
            name: "clone-repos".to_string(),
            image: self.kubernetes.git_image.clone(),
            command: vec!["/bin/sh".to_string(), "-c".to_string(), INIT_SCRIPT.to_string()],
            env: dirs.to_vec(),
            env_from: vec![EnvFromSource::secret(&job_secret)],
            volume_mounts: vec![workspace_mount.clone()],
            resources: None,
        };

        let mut env = dirs.to_vec();
        env.extend([
            EnvVar::new("JOB_ID", request.job_id),
            EnvVar::new("PROJECT_ID", &request.project.id),
            EnvVar::new("PROJECT_NAME", &request.project.name),
            EnvVar::new("PROJECT_ABBREVIATION", &request.project.abbreviation),
            EnvVar::new("PHASE", request.phase.as_str()),
            EnvVar::new(
                "CALLBACK_URL",
                self.callback_url(&request.project.id, request.phase, request.module.map(|m| m.id.as_str())),
            ),
        ]);
        if let Some(module) = request.module {
            env.push(EnvVar::new("MODULE_ID", &module.id));
            env.push(EnvVar::new("MODULE_NAME", &module.name));
            env.push(EnvVar::new("MODULE_PATH", &module.source_path));
        }

        let resources = &self.kubernetes.resources;
        let main_container = Container {
            name: "x2a".to_string(),
            image: self.kubernetes.image_ref(),
            command,
            env,
            env_from: vec![EnvFromSource::secret(project_secret), EnvFromSource::secret(job_secret)],
            volume_mounts: vec![workspace_mount],
            resources: Some(ResourceRequirements {
                requests: resources.requests.clone(),
                limits: resources.limits.clone(),
            }),
        };

        let service_account = Some(self.kubernetes.service_account.clone()).filter(|s| !s.is_empty());

        Ok(Job {
            api_version: "batch/v1".to_string(),
            kind: "Job".to_string(),
            metadata: self.meta(name, labels.clone()),
            spec: JobSpec {
                backoff_limit: BACKOFF_LIMIT,
                ttl_seconds_after_finished: Some(self.kubernetes.ttl_seconds_after_finished),
                template: PodTemplateSpec {
                    metadata: ObjectMeta {
                        labels,
                        ..ObjectMeta::default()
                    },
                    spec: PodSpec {
                        restart_policy: "Never".to_string(),
                        service_account_name: service_account,
                        init_containers: vec![init_container],
                        containers: vec![main_container],
                        volumes: vec![Volume {
                            name: WORKSPACE_VOLUME.to_string(),
                            empty_dir: EmptyDir {},
                        }],
                    },
                },
            },
            status: None,
        })
    }
}
