use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use leakwatch_core::cache::versions::EntityKind;
use leakwatch_core::tasks::job::{TaskId, TaskPayload};
use leakwatch_model::{NewRepoOwner, OwnerFilter, OwnerId, Page, Platform, RepoOwner};

use crate::errors::{AppError, AppResult};
use crate::handlers::cached_list;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnerListQuery {
    pub platform: Option<Platform>,
    pub name: Option<String>,
    pub is_organization: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_owners_handler(
    State(state): State<AppState>,
    Query(query): Query<OwnerListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = Page::new(query.page, query.page_size);
    let filter = OwnerFilter {
        platform: query.platform,
        name: query.name.clone(),
        is_organization: query.is_organization,
    };

    let mut params: Vec<(&str, String)> = vec![
        ("page", page.number.to_string()),
        ("page_size", page.size.to_string()),
    ];
    if let Some(platform) = query.platform {
        params.push(("platform", platform.to_string()));
    }
    if let Some(name) = &query.name {
        params.push(("name", name.clone()));
    }
    if let Some(is_organization) = query.is_organization {
        params.push(("is_organization", is_organization.to_string()));
    }

    cached_list(&state, EntityKind::Owners, "owners", &params, async {
        let owners = state.uow.owners.list_owners(&filter, page).await?;
        Ok(serde_json::to_value(owners).map_err(|e| AppError::internal(e.to_string()))?)
    })
    .await
}

#[derive(Debug, Serialize)]
pub struct CreateOwnerResponse {
    pub owner: RepoOwner,
    /// Handle for the repo-discovery unit dispatched for the new owner;
    /// absent when the platform has no integration or dispatch failed.
    pub discovery_task_id: Option<TaskId>,
}

pub async fn create_owner_handler(
    State(state): State<AppState>,
    Json(new_owner): Json<NewRepoOwner>,
) -> AppResult<impl IntoResponse> {
    if new_owner.name.is_empty() {
        return Err(AppError::bad_request("owner name must not be empty"));
    }

    let (owner, created) = state.uow.owners.get_or_create_owner(&new_owner).await?;
    if !created {
        return Err(AppError::conflict(format!(
            "owner {} already exists on {}",
            owner.name, owner.platform
        )));
    }

    if let Err(e) = state.versions.bump(EntityKind::Owners).await {
        error!(error = %e, "failed to bump owner cache version");
    }

    // Creating an owner kicks off repository discovery, as an explicit
    // dispatch rather than a storage-layer hook.
    let discovery_task_id = if owner.platform.is_supported() {
        match state
            .dispatcher
            .dispatch(TaskPayload::DiscoverOwnerRepos { owner_id: owner.id })
            .await
        {
            Ok(handle) => Some(handle.id),
            Err(e) => {
                error!(owner = %owner, error = %e, "failed to dispatch repo discovery");
                None
            }
        }
    } else {
        info!(owner = %owner, "no integration for platform, skipping discovery dispatch");
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateOwnerResponse {
            owner,
            discovery_task_id,
        }),
    ))
}

pub async fn get_owner_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RepoOwner>> {
    let owner = state
        .uow
        .owners
        .get_owner(OwnerId(id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("owner {id} not found")))?;
    Ok(Json(owner))
}

pub async fn delete_owner_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let deleted = state.uow.owners.delete_owner(OwnerId(id)).await?;
    if !deleted {
        return Err(AppError::not_found(format!("owner {id} not found")));
    }

    if let Err(e) = state.versions.bump(EntityKind::Owners).await {
        error!(error = %e, "failed to bump owner cache version");
    }

    Ok(StatusCode::NO_CONTENT)
}
