use async_trait::async_trait;

use leakwatch_model::{NewRepo, Page, Repo, RepoFilter, RepoId};

use crate::Result;

#[async_trait]
pub trait RepoRepository: Send + Sync {
    async fn get_repo(&self, id: RepoId) -> Result<Option<Repo>>;
    async fn list_repos(&self, filter: &RepoFilter, page: Page) -> Result<Vec<Repo>>;
    /// Every tracked repository, for the bulk scan trigger.
    async fn all_repos(&self) -> Result<Vec<Repo>>;
    /// Idempotent on `(https_url, ssh_url, owner_id, name)`; defaults from
    /// `new` apply on first insert only. The boolean reports creation.
    async fn get_or_create_repo(&self, new: &NewRepo) -> Result<(Repo, bool)>;
    /// Shift `previous_commit_sha <- latest_commit_sha` and set the new
    /// watermark in one atomic statement. Only the scan coordinator calls
    /// this, and only after a fully successful cycle.
    async fn advance_watermark(&self, id: RepoId, latest_sha: &str) -> Result<()>;
    /// Atomic check-and-set of the scan admission flag. Returns false when
    /// another cycle already holds it.
    async fn try_begin_scan(&self, id: RepoId) -> Result<bool>;
    async fn finish_scan(&self, id: RepoId) -> Result<()>;
}
