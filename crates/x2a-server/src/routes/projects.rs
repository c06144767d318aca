use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use x2a_core::entities::NewProject;
use x2a_core::enums::MigrationPhase;
use x2a_service::requests::CreateModuleRequest;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::identity::Caller;
use crate::state::AppState;

pub(crate) async fn list_projects(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orchestrator.list_projects(&caller).await?))
}

pub(crate) async fn create_project(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(new): ApiJson<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.orchestrator.create_project(&caller, &new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub(crate) async fn get_project(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orchestrator.get_project(&caller, &project_id).await?))
}

pub(crate) async fn delete_project(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.orchestrator.delete_project(&caller, &project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_modules(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orchestrator.list_modules(&caller, &project_id).await?))
}

pub(crate) async fn create_module(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<CreateModuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let module = state
        .orchestrator
        .create_module(&caller, &project_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(module)))
}

pub(crate) async fn get_module(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((project_id, module_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .orchestrator
            .get_module(&caller, &project_id, &module_id)
            .await?,
    ))
}

pub(crate) async fn delete_module(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((project_id, module_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .orchestrator
        .delete_module(&caller, &project_id, &module_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobsQuery {
    module_id: Option<String>,
    phase: Option<String>,
}

/// Parse an optional `phase` query value.
pub(crate) fn parse_phase(raw: Option<&str>) -> Result<Option<MigrationPhase>, ApiError> {
    raw.filter(|p| !p.is_empty())
        .map(|p| p.parse::<MigrationPhase>().map_err(|e| ApiError::input(e.to_string())))
        .transpose()
}

pub(crate) async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(project_id): Path<String>,
    ApiQuery(query): ApiQuery<JobsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let phase = parse_phase(query.phase.as_deref())?;
    let jobs = state
        .orchestrator
        .list_jobs(&caller, &project_id, query.module_id.as_deref(), phase)
        .await?;
    Ok(Json(jobs))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::routes::test_support::{body_json, caller, test_app};

    fn new_project() -> NewProject {
        serde_json::from_value(serde_json::json!({
            "name": "Infra",
            "abbreviation": "infra",
            "sourceRepoUrl": "https://github.com/acme/chef-repo",
            "sourceRepoBranch": "main",
            "targetRepoUrl": "https://github.com/acme/ansible-repo",
            "targetRepoBranch": "main"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_list_delete_project() {
        let app = test_app().await;
        let (status, created) = body_json(
            create_project(State(app.state.clone()), caller("user:a"), ApiJson(new_project())).await,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"]["state"], "created");
        assert_eq!(created["createdBy"], "user:a");
        let id = created["id"].as_str().unwrap().to_string();

        let (_, list) = body_json(list_projects(State(app.state.clone()), caller("user:a")).await).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, body) = body_json(
            get_project(State(app.state.clone()), caller("user:b"), Path(id.clone())).await,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFoundError");

        let (status, _) =
            body_json(delete_project(State(app.state.clone()), caller("user:a"), Path(id)).await).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn module_crud_and_views() {
        let app = test_app().await;
        let project = app
            .store
            .create_project(&new_project(), "user:a")
            .await
            .unwrap();

        let (status, module) = body_json(
            create_module(
                State(app.state.clone()),
                caller("user:a"),
                Path(project.id.clone()),
                ApiJson(CreateModuleRequest {
                    name: "nginx".into(),
                    source_path: "cookbooks/nginx".into(),
                }),
            )
            .await,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let module_id = module["id"].as_str().unwrap().to_string();

        let (_, modules) = body_json(
            list_modules(State(app.state.clone()), caller("user:a"), Path(project.id.clone())).await,
        )
        .await;
        assert_eq!(modules[0]["name"], "nginx");
        assert_eq!(modules[0]["status"], "pending");

        let (status, _) = body_json(
            delete_module(
                State(app.state.clone()),
                caller("user:a"),
                Path((project.id.clone(), module_id.clone())),
            )
            .await,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = body_json(
            get_module(State(app.state), caller("user:a"), Path((project.id, module_id))).await,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn phase_query_parsing() {
        assert_eq!(parse_phase(None).unwrap(), None);
        assert_eq!(parse_phase(Some("")).unwrap(), None);
        assert_eq!(parse_phase(Some("migrate")).unwrap(), Some(MigrationPhase::Migrate));
        assert_eq!(parse_phase(Some("deploy")).unwrap_err().status, StatusCode::BAD_REQUEST);
    }
}
