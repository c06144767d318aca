//! Serde models of the Kubernetes objects this crate creates and reads.
//!
//! Only the fields x2a sets or inspects are modelled; unknown fields in API
//! responses are ignored.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Assigned by the API server.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

/// Garbage-collection link from a dependent object to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

impl OwnerReference {
    /// Reference to a `batch/v1` Job.
    #[must_use]
    pub fn job(name: &str, uid: &str) -> Self {
        Self {
            api_version: "batch/v1".to_string(),
            kind: "Job".to_string(),
            name: name.to_string(),
            uid: uid.to_string(),
        }
    }
}

/// A `v1/Secret`. `data` values are base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(rename = "type", default)]
    pub secret_type: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl Secret {
    /// An `Opaque` secret holding `entries` (plain text, encoded here).
    #[must_use]
    pub fn opaque(metadata: ObjectMeta, entries: &BTreeMap<String, String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
            metadata,
            secret_type: "Opaque".to_string(),
            data: entries
                .iter()
                .map(|(k, v)| (k.clone(), STANDARD.encode(v)))
                .collect(),
        }
    }

    /// Decode one entry. `None` if absent or not valid base64 UTF-8.
    #[must_use]
    pub fn decoded(&self, key: &str) -> Option<String> {
        let raw = STANDARD.decode(self.data.get(key)?).ok()?;
        String::from_utf8(raw).ok()
    }
}

/// A `batch/v1/Job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: JobSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    #[serde(default)]
    pub backoff_limit: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds_after_finished: Option<i64>,
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub restart_policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<Container>,
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvFromSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
    pub secret_ref: SecretReference,
}

impl EnvFromSource {
    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            secret_ref: SecretReference { name: name.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    pub empty_dir: EmptyDir,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyDir {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
}

/// Raw Job status as reported by the API server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub active: Option<i32>,
    #[serde(default)]
    pub succeeded: Option<i32>,
    #[serde(default)]
    pub failed: Option<i32>,
    #[serde(default)]
    pub conditions: Vec<JobCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic `List` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// The part of a `v1/Pod` needed to locate job logs.
#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_data_is_base64() {
        let entries = BTreeMap::from([("TOKEN".to_string(), "s3cr3t".to_string())]);
        let secret = Secret::opaque(
            ObjectMeta {
                name: "x".into(),
                ..ObjectMeta::default()
            },
            &entries,
        );
        assert_eq!(secret.data["TOKEN"], "czNjcjN0");
        assert_eq!(secret.decoded("TOKEN").as_deref(), Some("s3cr3t"));
        assert_eq!(secret.decoded("MISSING"), None);
    }

    #[test]
    fn owner_reference_wire_shape() {
        let meta = ObjectMeta {
            name: "x2a-job-1".into(),
            owner_references: vec![OwnerReference::job("job-x2a-init-1", "8f2c")],
            ..ObjectMeta::default()
        };
        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            serde_json::json!({
                "name": "x2a-job-1",
                "ownerReferences": [{
                    "apiVersion": "batch/v1",
                    "kind": "Job",
                    "name": "job-x2a-init-1",
                    "uid": "8f2c"
                }]
            })
        );
    }

    #[test]
    fn parses_api_job_status() {
        let json = r#"{
            "active": 1,
            "conditions": [{"type": "Complete", "status": "False", "lastProbeTime": null}]
        }"#;
        let status: JobStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.active, Some(1));
        assert_eq!(status.succeeded, None);
        assert_eq!(status.conditions[0].condition_type, "Complete");
    }
}
