//! # x2a-k8s
//!
//! Kubernetes side of the x2a migration pipeline:
//! - [`builder::ResourceSpecBuilder`] turns a phase run into a project Secret,
//!   a per-job Secret, and a Job manifest (pure, no I/O)
//! - [`gateway::ClusterApi`] is the narrow interface to the cluster, with
//!   [`client::KubeClient`] implementing it over the REST API and
//!   `memory::InMemoryCluster` in process (`test-utils` feature)
//!
//! Credential validation and label sanitization feed the builder.

pub mod builder;
pub mod client;
pub mod command;
pub mod credentials;
pub mod gateway;
pub mod labels;
pub mod manifest;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

mod error;
mod http;

pub use error::{ClusterError, SpecError};
