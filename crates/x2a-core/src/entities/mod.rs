//! Entity structs for the x2a domain.
//!
//! Each entity maps to a table in the libSQL database (see `x2a-db`
//! migrations). All structs derive `Serialize`, `Deserialize`, and
//! `JsonSchema` and render in `camelCase` for API clients.

mod artifact;
mod job;
mod module;
mod project;

pub use artifact::{Artifact, NewArtifact};
pub use job::Job;
pub use module::{Module, ModuleMetadataEntry};
pub use project::{NewProject, Project};
