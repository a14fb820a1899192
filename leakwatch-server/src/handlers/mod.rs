pub mod owners;
pub mod repos;
pub mod results;
pub mod tasks;

use axum::Json;
use serde_json::Value;
use std::future::Future;
use tracing::warn;

use leakwatch_core::cache::versions::EntityKind;

use crate::errors::AppResult;
use crate::infra::app_state::AppState;
use crate::infra::response_cache::ResponseCache;

/// Serve a list response through the version-keyed cache. `fetch` only runs
/// on a miss (or when caching is disabled); its result is cached as-is.
pub(crate) async fn cached_list<F>(
    state: &AppState,
    kind: EntityKind,
    view: &str,
    params: &[(&str, String)],
    fetch: F,
) -> AppResult<Json<Value>>
where
    F: Future<Output = AppResult<Value>>,
{
    let version = match state.versions.current(kind).await {
        Ok(version) => version,
        Err(e) => {
            // An unreadable version token just bypasses the cache.
            warn!(kind = %kind, error = %e, "failed to read cache version");
            return Ok(Json(fetch.await?));
        }
    };

    let key = ResponseCache::make_key(view, params, version);

    if let Some(cache) = &state.response_cache {
        if let Some(hit) = cache.get(&key).await {
            return Ok(Json(hit));
        }
    }

    let value = fetch.await?;

    if let Some(cache) = &state.response_cache {
        cache.set(&key, &value).await;
    }

    Ok(Json(value))
}
