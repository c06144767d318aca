//! Caller identity and admin permission decisions.
//!
//! The identity comes from a header set by the fronting proxy; the admin
//! decisions come from a [`PermissionPolicy`].

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use x2a_config::AuthConfig;
use x2a_core::identity::CallerIdentity;

use crate::error::ApiError;
use crate::state::AppState;

/// Decides the two admin permissions for a caller.
pub trait PermissionPolicy: Send + Sync {
    fn can_view_all(&self, user_ref: &str) -> bool;
    fn can_write_all(&self, user_ref: &str) -> bool;
}

/// Admin lists read from `auth.admin_viewers` / `auth.admin_writers`.
/// Writers may also view.
#[derive(Debug, Default)]
pub struct ConfiguredPermissions {
    viewers: HashSet<String>,
    writers: HashSet<String>,
}

impl ConfiguredPermissions {
    #[must_use]
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            viewers: auth.admin_viewers.iter().cloned().collect(),
            writers: auth.admin_writers.iter().cloned().collect(),
        }
    }
}

impl PermissionPolicy for ConfiguredPermissions {
    fn can_view_all(&self, user_ref: &str) -> bool {
        self.viewers.contains(user_ref) || self.writers.contains(user_ref)
    }

    fn can_write_all(&self, user_ref: &str) -> bool {
        self.writers.contains(user_ref)
    }
}

/// Resolves callers from a request header.
pub struct HeaderIdentity {
    header: String,
    permissions: Arc<dyn PermissionPolicy>,
}

impl HeaderIdentity {
    pub fn new(header: impl Into<String>, permissions: Arc<dyn PermissionPolicy>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
            permissions,
        }
    }

    /// # Errors
    ///
    /// `401` when the header is absent, blank, or not valid UTF-8.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
        let user_ref = headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthenticated("missing caller identity"))?;

        Ok(CallerIdentity {
            user_ref: user_ref.to_string(),
            can_view_all: self.permissions.can_view_all(user_ref),
            can_write_all: self.permissions.can_write_all(user_ref),
        })
    }
}

/// Extractor for the authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.identity.resolve(&parts.headers).map(Self)
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
