//! Run submission, job callbacks, and log retrieval.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use x2a_core::enums::MigrationPhase;
use x2a_service::requests::{CollectArtifactsRequest, RunRequest};
use x2a_service::{CallbackOrigin, LogOutput};

use super::projects::parse_phase;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::identity::{Caller, bearer_token};
use crate::state::AppState;

pub(crate) async fn run_project(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<RunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .orchestrator
        .run_project_init(&caller, &project_id, &request)
        .await?;
    Ok(Json(response))
}

pub(crate) async fn run_module(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((project_id, module_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<RunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .orchestrator
        .run_module(&caller, &project_id, &module_id, &request)
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallbackQuery {
    phase: Option<String>,
    module_id: Option<String>,
}

/// Called by the job itself, so there is no caller identity; the bearer
/// token authenticates it.
pub(crate) async fn collect_artifacts(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CollectArtifactsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let phase = parse_phase(query.phase.as_deref())?
        .ok_or_else(|| ApiError::input("phase is required"))?;
    let origin = CallbackOrigin {
        project_id: &project_id,
        phase,
        module_id: query.module_id.as_deref(),
        bearer_token: bearer_token(&headers),
    };
    let response = state.orchestrator.collect_artifacts(origin, request).await?;
    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogQuery {
    phase: Option<String>,
    #[serde(default)]
    streaming: bool,
}

fn log_response(output: LogOutput) -> Response {
    let body = match output {
        LogOutput::Text(text) => Body::from(text),
        LogOutput::Stream(stream) => Body::from_stream(stream),
    };
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

pub(crate) async fn project_log(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
    ApiQuery(query): ApiQuery<LogQuery>,
) -> Result<Response, ApiError> {
    let phase = parse_phase(query.phase.as_deref())?.unwrap_or(MigrationPhase::Init);
    let output = state
        .orchestrator
        .job_log(&caller, &project_id, None, phase, query.streaming)
        .await?;
    Ok(log_response(output))
}

pub(crate) async fn module_log(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((project_id, module_id)): Path<(String, String)>,
    ApiQuery(query): ApiQuery<LogQuery>,
) -> Result<Response, ApiError> {
    let phase = parse_phase(query.phase.as_deref())?
        .ok_or_else(|| ApiError::input("phase is required"))?;
    let output = state
        .orchestrator
        .job_log(&caller, &project_id, Some(&module_id), phase, query.streaming)
        .await?;
    Ok(log_response(output))
}
