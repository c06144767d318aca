//! [`ClusterApi`] over the Kubernetes REST API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use x2a_config::KubernetesConfig;

use crate::error::ClusterError;
use crate::gateway::{ClusterApi, ClusterJobStatus, JobRef, LogStream, translate_job_status};
use crate::http::{check_optional, check_response};
use crate::manifest::{Job, ObjectList, OwnerReference, Pod, Secret};

/// HTTP client for one namespace of one cluster.
pub struct KubeClient {
    http: reqwest::Client,
    api_server: String,
    namespace: String,
    token: Option<String>,
}

impl KubeClient {
    /// Build a client from configuration.
    ///
    /// The bearer token comes from `token`, else from `token_file` when it
    /// exists. The CA bundle is trusted when `ca_cert_file` exists.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::Config` if a present token or CA file cannot be
    /// read or the HTTP client cannot be built.
    pub fn from_config(config: &KubernetesConfig) -> Result<Self, ClusterError> {
        let token = if config.token.is_empty() {
            read_optional(&config.token_file)?.map(|t| t.trim().to_string())
        } else {
            Some(config.token.clone())
        };

        let mut builder = reqwest::Client::builder()
            .user_agent("x2a/0.1")
            .connect_timeout(Duration::from_secs(10));
        if let Some(pem) = read_optional(&config.ca_cert_file)? {
            let cert = reqwest::Certificate::from_pem(pem.as_bytes())
                .map_err(|e| ClusterError::Config(format!("invalid CA bundle: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|e| ClusterError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_server: config.api_server.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            token,
        })
    }

    fn core_url(&self, resource: &str) -> String {
        format!(
            "{}/api/v1/namespaces/{}/{resource}",
            self.api_server,
            urlencoding::encode(&self.namespace)
        )
    }

    fn batch_url(&self, resource: &str) -> String {
        format!(
            "{}/apis/batch/v1/namespaces/{}/{resource}",
            self.api_server,
            urlencoding::encode(&self.namespace)
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ClusterError> {
        let resp = self.request(reqwest::Method::GET, url).send().await?;
        match check_optional(resp).await? {
            Some(resp) => Ok(Some(resp.json().await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, url: &str) -> Result<(), ClusterError> {
        let resp = self.request(reqwest::Method::DELETE, url).send().await?;
        check_optional(resp).await?;
        Ok(())
    }

    /// Name of the first pod created for `job_name`, if any.
    async fn job_pod(&self, job_name: &str) -> Result<Option<String>, ClusterError> {
        let selector = format!("job-name={job_name}");
        let url = format!(
            "{}?labelSelector={}",
            self.core_url("pods"),
            urlencoding::encode(&selector)
        );
        let pods: Option<ObjectList<Pod>> = self.get_json(&url).await?;
        Ok(pods.and_then(|list| list.items.into_iter().next()).map(|p| p.metadata.name))
    }

    fn log_url(&self, pod: &str, follow: bool) -> String {
        let mut url = format!(
            "{}/{}/log?container=x2a",
            self.core_url("pods"),
            urlencoding::encode(pod)
        );
        if follow {
            url.push_str("&follow=true");
        }
        url
    }
}

fn read_optional(path: &str) -> Result<Option<String>, ClusterError> {
    if path.is_empty() || !Path::new(path).exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| ClusterError::Config(format!("reading {path}: {e}")))
}

#[async_trait]
impl ClusterApi for KubeClient {
    async fn create_secret(&self, secret: &Secret) -> Result<(), ClusterError> {
        let resp = self
            .request(reqwest::Method::POST, &self.core_url("secrets"))
            .json(secret)
            .send()
            .await?;
        check_response(resp).await?;
        tracing::debug!(secret = %secret.metadata.name, "secret created");
        Ok(())
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<(), ClusterError> {
        let resp = self
            .request(reqwest::Method::POST, &self.core_url("secrets"))
            .json(secret)
            .send()
            .await?;
        if resp.status() != reqwest::StatusCode::CONFLICT {
            check_response(resp).await?;
            tracing::debug!(secret = %secret.metadata.name, "secret created");
            return Ok(());
        }

        let url = format!(
            "{}/{}",
            self.core_url("secrets"),
            urlencoding::encode(&secret.metadata.name)
        );
        let resp = self
            .request(reqwest::Method::PUT, &url)
            .json(secret)
            .send()
            .await?;
        check_response(resp).await?;
        tracing::debug!(secret = %secret.metadata.name, "secret replaced");
        Ok(())
    }

    async fn set_secret_owner(&self, name: &str, owner: &JobRef) -> Result<(), ClusterError> {
        let url = format!("{}/{}", self.core_url("secrets"), urlencoding::encode(name));
        let patch = serde_json::json!({
            "metadata": {
                "ownerReferences": [OwnerReference::job(&owner.name, &owner.uid)]
            }
        });
        let resp = self
            .request(reqwest::Method::PATCH, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/merge-patch+json")
            .body(patch.to_string())
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }

    async fn get_secret(&self, name: &str) -> Result<Option<Secret>, ClusterError> {
        let url = format!("{}/{}", self.core_url("secrets"), urlencoding::encode(name));
        self.get_json(&url).await
    }

    async fn delete_secret(&self, name: &str) -> Result<(), ClusterError> {
        let url = format!("{}/{}", self.core_url("secrets"), urlencoding::encode(name));
        self.delete(&url).await
    }

    async fn create_job(&self, job: &Job) -> Result<JobRef, ClusterError> {
        let resp = self
            .request(reqwest::Method::POST, &self.batch_url("jobs"))
            .json(job)
            .send()
            .await?;
        let created: Job = check_response(resp).await?.json().await?;
        tracing::info!(job = %created.metadata.name, "kubernetes job created");
        Ok(JobRef {
            name: created.metadata.name,
            uid: created.metadata.uid,
        })
    }

    async fn get_job_status(&self, name: &str) -> Result<ClusterJobStatus, ClusterError> {
        let url = format!("{}/{}", self.batch_url("jobs"), urlencoding::encode(name));
        let job: Option<Job> = self.get_json(&url).await?;
        Ok(job.map_or_else(ClusterJobStatus::not_found, |job| {
            translate_job_status(job.status.as_ref())
        }))
    }

    async fn delete_job(&self, name: &str) -> Result<(), ClusterError> {
        let url = format!(
            "{}/{}?propagationPolicy=Background",
            self.batch_url("jobs"),
            urlencoding::encode(name)
        );
        self.delete(&url).await
    }

    async fn list_jobs(&self, label_selector: &str) -> Result<Vec<Job>, ClusterError> {
        let url = format!(
            "{}?labelSelector={}",
            self.batch_url("jobs"),
            urlencoding::encode(label_selector)
        );
        let list: Option<ObjectList<Job>> = self.get_json(&url).await?;
        Ok(list.map(|l| l.items).unwrap_or_default())
    }

    async fn job_logs(&self, job_name: &str) -> Result<String, ClusterError> {
        let Some(pod) = self.job_pod(job_name).await? else {
            return Ok(String::new());
        };
        let resp = self
            .request(reqwest::Method::GET, &self.log_url(&pod, false))
            .send()
            .await?;
        match check_optional(resp).await? {
            Some(resp) => Ok(resp.text().await?),
            None => Ok(String::new()),
        }
    }

    async fn stream_job_logs(&self, job_name: &str) -> Result<LogStream, ClusterError> {
        let Some(pod) = self.job_pod(job_name).await? else {
            return Ok(futures::stream::empty().boxed());
        };
        let resp = self
            .request(reqwest::Method::GET, &self.log_url(&pod, true))
            .send()
            .await?;
        match check_optional(resp).await? {
            Some(resp) => Ok(resp.bytes_stream().map_err(ClusterError::from).boxed()),
            None => Ok(futures::stream::empty().boxed()),
        }
    }
}
