use x2a_service::Orchestrator;

use crate::identity::HeaderIdentity;

/// Shared state behind every route.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub identity: HeaderIdentity,
}
