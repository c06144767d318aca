//! HTTP routes.
//!
//! ```text
//! GET    /healthz
//! GET    {prefix}/projects                                   list
//! POST   {prefix}/projects                                   create
//! GET    {prefix}/projects/{projectId}                       get
//! DELETE {prefix}/projects/{projectId}                       delete
//! POST   {prefix}/projects/{projectId}/run                   init run
//! GET    {prefix}/projects/{projectId}/log                   init log
//! GET    {prefix}/projects/{projectId}/jobs                  jobs
//! POST   {prefix}/projects/{projectId}/collectArtifacts      job callback
//! GET    {prefix}/projects/{projectId}/modules               list
//! POST   {prefix}/projects/{projectId}/modules               create
//! GET    {prefix}/projects/{projectId}/modules/{moduleId}    get
//! DELETE {prefix}/projects/{projectId}/modules/{moduleId}    delete
//! POST   {prefix}/projects/{projectId}/modules/{moduleId}/run
//! GET    {prefix}/projects/{projectId}/modules/{moduleId}/log
//! ```

mod projects;
mod runs;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the full router with the API mounted under `api_prefix`.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let api = api_routes();
    let prefix = format!("/{}", api_prefix.trim_matches('/'));
    let app = if prefix == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&prefix, api)
    };
    app.route("/healthz", get(healthz)).with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{project_id}",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/projects/{project_id}/run", post(runs::run_project))
        .route("/projects/{project_id}/log", get(runs::project_log))
        .route("/projects/{project_id}/jobs", get(projects::list_jobs))
        .route(
            "/projects/{project_id}/collectArtifacts",
            post(runs::collect_artifacts),
        )
        .route(
            "/projects/{project_id}/modules",
            get(projects::list_modules).post(projects::create_module),
        )
        .route(
            "/projects/{project_id}/modules/{module_id}",
            get(projects::get_module).delete(projects::delete_module),
        )
        .route(
            "/projects/{project_id}/modules/{module_id}/run",
            post(runs::run_module),
        )
        .route(
            "/projects/{project_id}/modules/{module_id}/log",
            get(runs::module_log),
        )
}

async fn healthz() -> &'static str {
    "ok"
}
