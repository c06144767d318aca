//! Credential shapes carried into job Secrets, and their validation.
//!
//! AAP and LLM credentials each come in two mutually exclusive forms; a
//! request must supply exactly one of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use x2a_config::{AapConfig, LlmConfig};

use crate::error::SpecError;

/// Git credentials for one repository, supplied per run request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoAuth {
    pub token: String,
}

/// Ansible Automation Platform credentials supplied with a run request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AapCredentials {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub oauth_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The accepted AAP authentication form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AapAuth {
    OAuthToken(String),
    Basic { username: String, password: String },
}

/// AAP settings after merging request and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAap {
    pub controller_url: String,
    pub org_name: String,
    pub auth: AapAuth,
}

/// The accepted LLM authentication form. `Passthrough` means only opaque
/// `extra` pairs are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmAuth {
    AccessKeys {
        access_key_id: String,
        secret_access_key: String,
    },
    BearerToken(String),
    Passthrough,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn fallback(value: Option<&str>, config_value: &str) -> String {
    non_empty(value).unwrap_or_else(|| config_value.to_string())
}

/// Decide the AAP authentication form from optional fields.
///
/// # Errors
///
/// Returns `SpecError::Credentials` with a message specific to the violation:
/// nothing supplied, both forms supplied, or only half of username/password.
pub fn validate_aap_auth(
    oauth_token: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<AapAuth, SpecError> {
    let token = non_empty(oauth_token);
    let username = non_empty(username);
    let password = non_empty(password);

    match (token, username, password) {
        (None, None, None) => Err(SpecError::Credentials(
            "AAP credentials are required: provide either oauthToken or username and password"
                .to_string(),
        )),
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(SpecError::Credentials(
            "AAP credentials must use either oauthToken or username/password, not both".to_string(),
        )),
        (Some(token), None, None) => Ok(AapAuth::OAuthToken(token)),
        (None, Some(username), Some(password)) => Ok(AapAuth::Basic { username, password }),
        (None, Some(_), None) | (None, None, Some(_)) => Err(SpecError::Credentials(
            "AAP username and password must be provided together".to_string(),
        )),
    }
}

/// Merge request-supplied AAP credentials over configuration.
///
/// When the request carries any credential field, its credentials replace the
/// configured ones entirely; URL and organization fall back to configuration
/// field by field.
///
/// # Errors
///
/// Returns `SpecError::Credentials` when the winning source fails
/// [`validate_aap_auth`], or when no controller URL is known.
pub fn resolve_aap(
    requested: Option<&AapCredentials>,
    config: &AapConfig,
) -> Result<ResolvedAap, SpecError> {
    let requested = requested.cloned().unwrap_or_default();
    let request_has_credentials = [&requested.oauth_token, &requested.username, &requested.password]
        .iter()
        .any(|v| non_empty(v.as_deref()).is_some());

    let auth = if request_has_credentials {
        validate_aap_auth(
            requested.oauth_token.as_deref(),
            requested.username.as_deref(),
            requested.password.as_deref(),
        )?
    } else {
        validate_aap_auth(
            Some(config.oauth_token.as_str()),
            Some(config.username.as_str()),
            Some(config.password.as_str()),
        )?
    };

    let controller_url = fallback(requested.url.as_deref(), &config.controller_url);
    if controller_url.trim().is_empty() {
        return Err(SpecError::Credentials(
            "AAP controller URL is required".to_string(),
        ));
    }

    Ok(ResolvedAap {
        controller_url,
        org_name: fallback(requested.org_name.as_deref(), &config.org_name),
        auth,
    })
}

/// Decide the LLM authentication form from configuration.
///
/// # Errors
///
/// Returns `SpecError::Credentials` when both forms are configured, when only
/// one of the access key pair is set, or when nothing at all is configured.
pub fn validate_llm(config: &LlmConfig) -> Result<LlmAuth, SpecError> {
    let key_id = non_empty(Some(config.access_key_id.as_str()));
    let secret = non_empty(Some(config.secret_access_key.as_str()));
    let bearer = non_empty(Some(config.bearer_token.as_str()));

    match (key_id, secret, bearer) {
        (None, None, None) if config.extra.is_empty() => Err(SpecError::Credentials(
            "LLM credentials are required: provide either accessKeyId and secretAccessKey or bearerToken"
                .to_string(),
        )),
        (None, None, None) => Ok(LlmAuth::Passthrough),
        (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => Err(SpecError::Credentials(
            "LLM credentials must use either accessKeyId/secretAccessKey or bearerToken, not both"
                .to_string(),
        )),
        (Some(access_key_id), Some(secret_access_key), None) => Ok(LlmAuth::AccessKeys {
            access_key_id,
            secret_access_key,
        }),
        (None, None, Some(token)) => Ok(LlmAuth::BearerToken(token)),
        (Some(_), None, None) | (None, Some(_), None) => Err(SpecError::Credentials(
            "LLM accessKeyId and secretAccessKey must be provided together".to_string(),
        )),
    }
}

/// Environment entries for the project Secret.
///
/// # Errors
///
/// Propagates validation failures from [`validate_llm`].
pub fn project_secret_entries(
    llm: &LlmConfig,
    aap: &ResolvedAap,
) -> Result<BTreeMap<String, String>, SpecError> {
    let mut data: BTreeMap<String, String> = llm.extra.clone();

    if !llm.model.is_empty() {
        data.insert("LLM_MODEL".into(), llm.model.clone());
    }
    if !llm.region.is_empty() {
        data.insert("AWS_REGION".into(), llm.region.clone());
    }
    match validate_llm(llm)? {
        LlmAuth::AccessKeys {
            access_key_id,
            secret_access_key,
        } => {
            data.insert("AWS_ACCESS_KEY_ID".into(), access_key_id);
            data.insert("AWS_SECRET_ACCESS_KEY".into(), secret_access_key);
        }
        LlmAuth::BearerToken(token) => {
            data.insert("AWS_BEARER_TOKEN_BEDROCK".into(), token);
        }
        LlmAuth::Passthrough => {}
    }

    data.insert("AAP_CONTROLLER_URL".into(), aap.controller_url.clone());
    if !aap.org_name.is_empty() {
        data.insert("AAP_ORG_NAME".into(), aap.org_name.clone());
    }
    match &aap.auth {
        AapAuth::OAuthToken(token) => {
            data.insert("AAP_OAUTH_TOKEN".into(), token.clone());
        }
        AapAuth::Basic { username, password } => {
            data.insert("AAP_USERNAME".into(), username.clone());
            data.insert("AAP_PASSWORD".into(), password.clone());
        }
    }
    Ok(data)
}
