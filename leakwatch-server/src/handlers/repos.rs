use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use leakwatch_core::cache::versions::EntityKind;
use leakwatch_model::{Page, Platform, Repo, RepoFilter, RepoId};

use crate::errors::{AppError, AppResult};
use crate::handlers::cached_list;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct RepoListQuery {
    pub owner: Option<String>,
    pub platform: Option<Platform>,
    pub is_private: Option<bool>,
    pub is_fork: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_repos_handler(
    State(state): State<AppState>,
    Query(query): Query<RepoListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let page = Page::new(query.page, query.page_size);
    let filter = RepoFilter {
        owner: query.owner.clone(),
        platform: query.platform,
        is_private: query.is_private,
        is_fork: query.is_fork,
    };

    let mut params: Vec<(&str, String)> = vec![
        ("page", page.number.to_string()),
        ("page_size", page.size.to_string()),
    ];
    if let Some(owner) = &query.owner {
        params.push(("owner", owner.clone()));
    }
    if let Some(platform) = query.platform {
        params.push(("platform", platform.to_string()));
    }
    if let Some(is_private) = query.is_private {
        params.push(("is_private", is_private.to_string()));
    }
    if let Some(is_fork) = query.is_fork {
        params.push(("is_fork", is_fork.to_string()));
    }

    cached_list(&state, EntityKind::Repos, "repos", &params, async {
        let repos = state.uow.repos.list_repos(&filter, page).await?;
        Ok(serde_json::to_value(repos).map_err(|e| AppError::internal(e.to_string()))?)
    })
    .await
}

pub async fn get_repo_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Repo>> {
    let repo = state
        .uow
        .repos
        .get_repo(RepoId(id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("repo {id} not found")))?;
    Ok(Json(repo))
}
