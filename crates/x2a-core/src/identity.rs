use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Authenticated caller identity plus the two admin decisions the
/// permission collaborator made for this request.
///
/// Produced by the server's identity/permission providers, consumed by the
/// orchestration layer and turned into an [`AccessScope`] for store queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Stable identity string (e.g. `user:default/jdoe`).
    pub user_ref: String,
    /// Allowed to view every project regardless of owner.
    pub can_view_all: bool,
    /// Allowed to modify every project regardless of owner.
    pub can_write_all: bool,
}

impl CallerIdentity {
    #[must_use]
    pub fn read_scope(&self) -> AccessScope {
        if self.can_view_all {
            AccessScope::All
        } else {
            AccessScope::Owner(self.user_ref.clone())
        }
    }

    #[must_use]
    pub fn write_scope(&self) -> AccessScope {
        if self.can_write_all {
            AccessScope::All
        } else {
            AccessScope::Owner(self.user_ref.clone())
        }
    }
}

/// Row filter applied by the store to project queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// No restriction.
    All,
    /// Only rows whose `created_by` equals the given identity.
    Owner(String),
}
