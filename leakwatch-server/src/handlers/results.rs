use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use leakwatch_core::cache::versions::EntityKind;
use leakwatch_model::{Page, RepoId, ScanResultFilter, ScanResultId, SecretScanResult};

use crate::errors::{AppError, AppResult};
use crate::handlers::cached_list;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanResultListQuery {
    pub repo_id: Option<Uuid>,
    pub secret_type: Option<String>,
    pub is_verified: Option<bool>,
    pub is_false_positive: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_results_handler(
    State(state): State<AppState>,
    Query(query): Query<ScanResultListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let page = Page::new(query.page, query.page_size);
    let filter = ScanResultFilter {
        repo_id: query.repo_id.map(RepoId),
        secret_type: query.secret_type.clone(),
        is_verified: query.is_verified,
        is_false_positive: query.is_false_positive,
    };

    let mut params: Vec<(&str, String)> = vec![
        ("page", page.number.to_string()),
        ("page_size", page.size.to_string()),
    ];
    if let Some(repo_id) = query.repo_id {
        params.push(("repo_id", repo_id.to_string()));
    }
    if let Some(secret_type) = &query.secret_type {
        params.push(("secret_type", secret_type.clone()));
    }
    if let Some(is_verified) = query.is_verified {
        params.push(("is_verified", is_verified.to_string()));
    }
    if let Some(is_false_positive) = query.is_false_positive {
        params.push(("is_false_positive", is_false_positive.to_string()));
    }

    cached_list(
        &state,
        EntityKind::ScanResults,
        "scan_results",
        &params,
        async {
            let results = state.uow.scan_results.list_results(&filter, page).await?;
            Ok(serde_json::to_value(results).map_err(|e| AppError::internal(e.to_string()))?)
        },
    )
    .await
}

pub async fn get_result_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SecretScanResult>> {
    let result = state
        .uow
        .scan_results
        .get_result(ScanResultId(id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("scan result {id} not found")))?;
    Ok(Json(result))
}

/// Review mutations applied by humans after triage.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub is_false_positive: Option<bool>,
    pub is_rotated: Option<bool>,
}

pub async fn review_result_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(review): Json<ReviewRequest>,
) -> AppResult<Json<SecretScanResult>> {
    if review.is_false_positive.is_none() && review.is_rotated.is_none() {
        return Err(AppError::bad_request(
            "at least one of is_false_positive / is_rotated is required",
        ));
    }

    let updated = state
        .uow
        .scan_results
        .set_review_flags(ScanResultId(id), review.is_false_positive, review.is_rotated)
        .await?
        .ok_or_else(|| AppError::not_found(format!("scan result {id} not found")))?;

    if let Err(e) = state.versions.bump(EntityKind::ScanResults).await {
        error!(error = %e, "failed to bump scan-result cache version");
    }

    Ok(Json(updated))
}
