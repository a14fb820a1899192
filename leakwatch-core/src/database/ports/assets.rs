use async_trait::async_trait;

use leakwatch_model::{Asset, Repo};

use crate::Result;

#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Create the asset derived from a newly discovered repository.
    /// Idempotent per repo so discovery redelivery cannot duplicate it.
    async fn create_for_repo(&self, repo: &Repo) -> Result<Option<Asset>>;
}
