use std::fmt;
use std::sync::Arc;

use leakwatch_core::application::unit_of_work::AppUnitOfWork;
use leakwatch_core::cache::versions::CacheVersions;
use leakwatch_core::tasks::queue::TaskDispatcher;

use crate::infra::config::Config;
use crate::infra::response_cache::ResponseCache;

#[derive(Clone)]
pub struct AppState {
    pub uow: AppUnitOfWork,
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub versions: Arc<dyn CacheVersions>,
    /// Present only when Redis is configured and caching is enabled.
    pub response_cache: Option<ResponseCache>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn cache_enabled(&self) -> bool {
        self.response_cache.is_some()
    }
}
