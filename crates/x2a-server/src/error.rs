//! HTTP rendering of orchestration failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use x2a_core::enums::MigrationPhase;
use x2a_k8s::SpecError;
use x2a_service::OrchestrationError;

/// JSON error body: `{ "error": <code>, "message": <text> }`, plus the
/// active job for conflicts.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_job_phase: Option<MigrationPhase>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error,
                message: message.into(),
                active_job_id: None,
                active_job_phase: None,
            },
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InputError", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "AuthenticationError", message)
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(error: OrchestrationError) -> Self {
        match error {
            OrchestrationError::Input(message) => Self::input(message),
            OrchestrationError::NotFound(message) => {
                Self::new(StatusCode::NOT_FOUND, "NotFoundError", message)
            }
            OrchestrationError::Conflict {
                active_job_id,
                active_job_phase,
            } => Self {
                status: StatusCode::CONFLICT,
                body: ApiErrorBody {
                    error: "JobAlreadyRunning",
                    message: format!(
                        "A {active_job_phase} job is already running: {active_job_id}"
                    ),
                    active_job_id: Some(active_job_id),
                    active_job_phase: Some(active_job_phase),
                },
            },
            OrchestrationError::Unauthenticated(message) => Self::unauthenticated(message),
            OrchestrationError::NotAllowed(message) => {
                Self::new(StatusCode::FORBIDDEN, "NotAllowedError", message)
            }
            OrchestrationError::Spec(SpecError::Random(message)) => {
                tracing::error!(%message, "random source failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", message)
            }
            OrchestrationError::Spec(spec) => Self::input(spec.to_string()),
            error @ (OrchestrationError::Database(_) | OrchestrationError::Cluster(_)) => {
                tracing::error!(error = %error, "request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    error.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use x2a_db::error::DatabaseError;

    use super::*;

    #[tokio::test]
    async fn conflict_carries_active_job() {
        let response = ApiError::from(OrchestrationError::Conflict {
            active_job_id: "job-0123456789abcdef".into(),
            active_job_phase: MigrationPhase::Analyze,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "JobAlreadyRunning");
        assert_eq!(body["activeJobId"], "job-0123456789abcdef");
        assert_eq!(body["activeJobPhase"], "analyze");
    }

    #[rstest]
    #[case(OrchestrationError::Input("bad".into()), StatusCode::BAD_REQUEST)]
    #[case(OrchestrationError::NotFound("gone".into()), StatusCode::NOT_FOUND)]
    #[case(OrchestrationError::Unauthenticated("who".into()), StatusCode::UNAUTHORIZED)]
    #[case(OrchestrationError::NotAllowed("no".into()), StatusCode::FORBIDDEN)]
    #[case(
        OrchestrationError::Spec(SpecError::Credentials("AAP credentials are required".into())),
        StatusCode::BAD_REQUEST
    )]
    #[case(
        OrchestrationError::Database(DatabaseError::NoResult),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn status_mapping(#[case] error: OrchestrationError, #[case] status: StatusCode) {
        assert_eq!(ApiError::from(error).status, status);
    }

    #[test]
    fn plain_errors_omit_conflict_fields() {
        let body = serde_json::to_value(ApiError::input("phase is required").body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "InputError", "message": "phase is required"})
        );
    }
}
