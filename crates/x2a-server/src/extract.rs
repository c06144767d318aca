//! Body and query extractors whose rejections use the API error shape.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;

use crate::error::ApiError;

/// `Json<T>` that rejects malformed bodies with a 400 `InputError`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query<T>` that rejects malformed query strings with a 400 `InputError`.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::input(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use x2a_service::requests::{CollectArtifactsRequest, RunRequest};

    use super::*;
    use crate::routes::test_support::body_json;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_phase_in_run_body_is_400() {
        let err = ApiJson::<RunRequest>::from_request(json_request(r#"{"phase":"deploy"}"#), &())
            .await
            .unwrap_err();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InputError");
    }

    #[rstest]
    #[case::unknown_status(r#"{"status":"done","jobId":"job-0123456789abcdef"}"#)]
    #[case::unknown_artifact_type(
        r#"{"status":"success","jobId":"job-0123456789abcdef","artifacts":[{"type":"ansible_bundle","value":"x"}]}"#
    )]
    #[case::not_json("status=success")]
    #[tokio::test]
    async fn malformed_callback_body_is_400(#[case] body: &str) {
        let err = ApiJson::<CollectArtifactsRequest>::from_request(json_request(body), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "InputError");
    }

    #[tokio::test]
    async fn missing_content_type_is_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();
        let err = ApiJson::<RunRequest>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[derive(Debug, serde::Deserialize)]
    struct Flag {
        #[allow(dead_code)]
        streaming: bool,
    }

    #[tokio::test]
    async fn malformed_query_is_400() {
        let request = Request::builder()
            .uri("/?streaming=maybe")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let err = ApiQuery::<Flag>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "InputError");
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        let ApiJson(request) = ApiJson::<RunRequest>::from_request(json_request(r#"{"phase":"init"}"#), &())
            .await
            .unwrap();
        assert_eq!(request.phase, Some(x2a_core::enums::MigrationPhase::Init));
    }
}
