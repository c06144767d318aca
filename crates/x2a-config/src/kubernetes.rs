//! Kubernetes cluster and job template configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_api_server() -> String {
    "https://kubernetes.default.svc".to_string()
}

fn default_token_file() -> String {
    "/var/run/secrets/kubernetes.io/serviceaccount/token".to_string()
}

fn default_ca_cert_file() -> String {
    "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt".to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

const fn default_ttl_seconds_after_finished() -> i64 {
    3600
}

fn default_command() -> Vec<String> {
    vec!["uv".to_string(), "run".to_string(), "app.py".to_string()]
}

fn default_source_technology() -> String {
    "Chef".to_string()
}

fn default_git_image() -> String {
    "alpine/git:latest".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResourceRequirementsConfig {
    #[serde(default)]
    pub requests: BTreeMap<String, String>,
    #[serde(default)]
    pub limits: BTreeMap<String, String>,
}

impl Default for ResourceRequirementsConfig {
    fn default() -> Self {
        Self {
            requests: BTreeMap::from([
                ("cpu".to_string(), "500m".to_string()),
                ("memory".to_string(), "1Gi".to_string()),
            ]),
            limits: BTreeMap::from([
                ("cpu".to_string(), "2".to_string()),
                ("memory".to_string(), "4Gi".to_string()),
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KubernetesConfig {
    /// API server base URL.
    #[serde(default = "default_api_server")]
    pub api_server: String,

    /// Namespace all Secrets and Jobs are created in. Required.
    #[serde(default)]
    pub namespace: String,

    /// Bearer token; when empty, `token_file` is read instead.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_token_file")]
    pub token_file: String,

    /// PEM bundle trusted for the API server; skipped when the file is absent.
    #[serde(default = "default_ca_cert_file")]
    pub ca_cert_file: String,

    /// Migration tool image. Required.
    #[serde(default)]
    pub image: String,

    #[serde(default = "default_image_tag")]
    pub image_tag: String,

    /// Image for the repository-cloning init container.
    #[serde(default = "default_git_image")]
    pub git_image: String,

    /// Service account the job pods run as; cluster default when empty.
    #[serde(default)]
    pub service_account: String,

    #[serde(default = "default_ttl_seconds_after_finished")]
    pub ttl_seconds_after_finished: i64,

    #[serde(default)]
    pub resources: ResourceRequirementsConfig,

    /// Base command of the migration tool; the phase arguments are appended.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Technology the sources are migrated from.
    #[serde(default = "default_source_technology")]
    pub source_technology: String,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            api_server: default_api_server(),
            namespace: String::new(),
            token: String::new(),
            token_file: default_token_file(),
            ca_cert_file: default_ca_cert_file(),
            image: String::new(),
            image_tag: default_image_tag(),
            git_image: default_git_image(),
            service_account: String::new(),
            ttl_seconds_after_finished: default_ttl_seconds_after_finished(),
            resources: ResourceRequirementsConfig::default(),
            command: default_command(),
            source_technology: default_source_technology(),
        }
    }
}

impl KubernetesConfig {
    /// `image:tag` reference of the migration tool.
    #[must_use]
    pub fn image_ref(&self) -> String {
        if self.image_tag.is_empty() {
            self.image.clone()
        } else {
            format!("{}:{}", self.image, self.image_tag)
        }
    }
}
