//! # x2a-service
//!
//! Orchestration use cases of the x2a migration pipeline. An
//! [`Orchestrator`] owns the store, the spec builder, and a cluster
//! gateway, and exposes every operation the HTTP layer serves: project and
//! module management, run submission, reconciliation, callback ingestion,
//! and log retrieval.

pub mod callback;
pub mod error;
pub mod logs;
pub mod modules;
pub mod orchestrator;
pub mod projects;
pub mod reconcile;
pub mod requests;
pub mod run;

#[cfg(test)]
mod test_support;

pub use callback::CallbackOrigin;
pub use error::OrchestrationError;
pub use logs::LogOutput;
pub use orchestrator::{Orchestrator, OrchestratorSettings};
