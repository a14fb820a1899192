use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{owners, repos, results, tasks};
use crate::infra::app_state::AppState;

/// All v1 API routes.
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/owners",
            get(owners::list_owners_handler).post(owners::create_owner_handler),
        )
        .route(
            "/owners/{id}",
            get(owners::get_owner_handler).delete(owners::delete_owner_handler),
        )
        .route("/repos", get(repos::list_repos_handler))
        .route("/repos/{id}", get(repos::get_repo_handler))
        .route("/scan-results", get(results::list_results_handler))
        .route("/scan-results/{id}", get(results::get_result_handler))
        .route(
            "/scan-results/{id}/review",
            patch(results::review_result_handler),
        )
        .route("/tasks/trigger", post(tasks::trigger_task_handler))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", create_v1_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
