use async_trait::async_trait;

use leakwatch_model::{NewRepoOwner, OwnerFilter, OwnerId, Page, RepoOwner};

use crate::Result;

#[async_trait]
pub trait RepoOwnerRepository: Send + Sync {
    async fn get_owner(&self, id: OwnerId) -> Result<Option<RepoOwner>>;
    async fn list_owners(&self, filter: &OwnerFilter, page: Page) -> Result<Vec<RepoOwner>>;
    /// Idempotent on `(name, platform)`; the boolean reports whether a row
    /// was created.
    async fn get_or_create_owner(&self, new: &NewRepoOwner) -> Result<(RepoOwner, bool)>;
    async fn delete_owner(&self, id: OwnerId) -> Result<bool>;
    /// All organization-flagged owners, for member sync.
    async fn list_organizations(&self) -> Result<Vec<RepoOwner>>;
    /// All non-organization owners, for bulk repo discovery.
    async fn list_individuals(&self) -> Result<Vec<RepoOwner>>;
}
