//! Caller identity and permission configuration.

use serde::{Deserialize, Serialize};

fn default_user_header() -> String {
    "x-x2a-user".to_string()
}

const fn default_require_callback_token() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Request header carrying the authenticated caller identity, set by the
    /// fronting proxy.
    #[serde(default = "default_user_header")]
    pub user_header: String,

    /// Identities granted the "admin view" permission.
    #[serde(default)]
    pub admin_viewers: Vec<String>,

    /// Identities granted the "admin write" permission.
    #[serde(default)]
    pub admin_writers: Vec<String>,

    /// Reject callbacks that do not present the job's callback token.
    #[serde(default = "default_require_callback_token")]
    pub require_callback_token: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
            admin_viewers: Vec::new(),
            admin_writers: Vec::new(),
            require_callback_token: default_require_callback_token(),
        }
    }
}
