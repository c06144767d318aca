//! Shared HTTP response helpers for Kubernetes API calls.

use crate::error::ClusterError;

/// Return the response unchanged on success, otherwise
/// [`ClusterError::Api`] with the status code and body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ClusterError> {
    if !resp.status().is_success() {
        return Err(ClusterError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Like [`check_response`], but maps 404 to `Ok(None)`.
pub async fn check_optional(
    resp: reqwest::Response,
) -> Result<Option<reqwest::Response>, ClusterError> {
    match check_response(resp).await {
        Ok(resp) => Ok(Some(resp)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
