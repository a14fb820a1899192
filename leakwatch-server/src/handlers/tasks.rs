use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use leakwatch_core::tasks::job::{TaskId, TaskPayload};
use leakwatch_model::{OwnerId, RepoId};

use crate::errors::{AppError, AppResult};
use crate::infra::app_state::AppState;

fn default_concurrency() -> u32 {
    10
}

/// The invokable operations, as a closed enumeration. Argument shapes are
/// checked during deserialization, so an unknown task or a malformed payload
/// never reaches the dispatcher.
#[derive(Debug, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TriggerTaskRequest {
    DiscoverOwnerRepos {
        owner_id: OwnerId,
    },
    ScanRepo {
        repo_id: RepoId,
        #[serde(default = "default_concurrency")]
        concurrency: u32,
        #[serde(default)]
        only_verified: bool,
    },
    SyncOrgMembers,
    ScanAllRepos {
        #[serde(default = "default_concurrency")]
        concurrency: u32,
        #[serde(default)]
        only_verified: bool,
    },
    SyncOwnerRepos,
}

impl From<TriggerTaskRequest> for TaskPayload {
    fn from(request: TriggerTaskRequest) -> Self {
        match request {
            TriggerTaskRequest::DiscoverOwnerRepos { owner_id } => {
                TaskPayload::DiscoverOwnerRepos { owner_id }
            }
            TriggerTaskRequest::ScanRepo {
                repo_id,
                concurrency,
                only_verified,
            } => TaskPayload::ScanRepo {
                repo_id,
                concurrency,
                only_verified,
            },
            TriggerTaskRequest::SyncOrgMembers => TaskPayload::SyncOrgMembers,
            TriggerTaskRequest::ScanAllRepos {
                concurrency,
                only_verified,
            } => TaskPayload::ScanAllRepos {
                concurrency,
                only_verified,
            },
            TriggerTaskRequest::SyncOwnerRepos => TaskPayload::SyncOwnerRepos,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TriggerTaskResponse {
    pub task_id: TaskId,
    pub status: &'static str,
}

/// Accepts a task for asynchronous execution. A 202 acknowledges dispatch
/// only; unit success or failure is observable through logs and state, not
/// through this endpoint.
pub async fn trigger_task_handler(
    State(state): State<AppState>,
    Json(request): Json<TriggerTaskRequest>,
) -> AppResult<impl IntoResponse> {
    let payload: TaskPayload = request.into();
    let kind = payload.kind();

    let handle = state.dispatcher.dispatch(payload).await.map_err(|e| {
        error!(%kind, error = %e, "failed to trigger task");
        AppError::bad_gateway("failed to trigger task")
    })?;

    info!(%kind, task_id = %handle.id, "task triggered");

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerTaskResponse {
            task_id: handle.id,
            status: "accepted",
        }),
    ))
}
