use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::ports::{
    assets::AssetRepository, owners::RepoOwnerRepository, repos::RepoRepository,
    scan_results::SecretScanResultRepository,
};
use crate::database::postgres::PostgresDatabase;
use crate::database::infrastructure::postgres::{
    PostgresAssetRepository, PostgresRepoOwnerRepository, PostgresRepoRepository,
    PostgresSecretScanResultRepository,
};

/// Aggregates the repository ports used by the orchestration and HTTP
/// layers.
///
/// Composition over a monolithic database interface keeps construction and
/// testing straightforward: tests swap individual ports for in-memory fakes.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub owners: Arc<dyn RepoOwnerRepository>,
    pub repos: Arc<dyn RepoRepository>,
    pub scan_results: Arc<dyn SecretScanResultRepository>,
    pub assets: Arc<dyn AssetRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("owners", &type_name_of_val(self.owners.as_ref()))
            .field("repos", &type_name_of_val(self.repos.as_ref()))
            .field(
                "scan_results",
                &type_name_of_val(self.scan_results.as_ref()),
            )
            .field("assets", &type_name_of_val(self.assets.as_ref()))
            .finish()
    }
}

impl AppUnitOfWork {
    /// Convenience helper to compose all Postgres-backed repositories.
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        AppUnitOfWorkBuilder::new().with_postgres(db).build_unchecked()
    }
}

#[derive(Default)]
pub struct AppUnitOfWorkBuilder {
    owners: Option<Arc<dyn RepoOwnerRepository>>,
    repos: Option<Arc<dyn RepoRepository>>,
    scan_results: Option<Arc<dyn SecretScanResultRepository>>,
    assets: Option<Arc<dyn AssetRepository>>,
}

impl fmt::Debug for AppUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWorkBuilder")
            .field("owners", &self.owners.is_some())
            .field("repos", &self.repos.is_some())
            .field("scan_results", &self.scan_results.is_some())
            .field("assets", &self.assets.is_some())
            .finish()
    }
}

impl AppUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owners(mut self, repo: Arc<dyn RepoOwnerRepository>) -> Self {
        self.owners = Some(repo);
        self
    }

    pub fn with_repos(mut self, repo: Arc<dyn RepoRepository>) -> Self {
        self.repos = Some(repo);
        self
    }

    pub fn with_scan_results(mut self, repo: Arc<dyn SecretScanResultRepository>) -> Self {
        self.scan_results = Some(repo);
        self
    }

    pub fn with_assets(mut self, repo: Arc<dyn AssetRepository>) -> Self {
        self.assets = Some(repo);
        self
    }

    /// Populate the builder with Postgres-backed repository adapters.
    pub fn with_postgres(mut self, db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();

        self.owners = Some(Arc::new(PostgresRepoOwnerRepository::new(pool.clone())));
        self.repos = Some(Arc::new(PostgresRepoRepository::new(pool.clone())));
        self.scan_results = Some(Arc::new(PostgresSecretScanResultRepository::new(
            pool.clone(),
        )));
        self.assets = Some(Arc::new(PostgresAssetRepository::new(pool)));

        self
    }

    /// Build a validated unit of work. Errors name the missing port; keep
    /// them simple for ease of use at call sites.
    pub fn build(self) -> Result<AppUnitOfWork, String> {
        Ok(AppUnitOfWork {
            owners: self
                .owners
                .ok_or_else(|| "missing RepoOwnerRepository".to_string())?,
            repos: self
                .repos
                .ok_or_else(|| "missing RepoRepository".to_string())?,
            scan_results: self
                .scan_results
                .ok_or_else(|| "missing SecretScanResultRepository".to_string())?,
            assets: self
                .assets
                .ok_or_else(|| "missing AssetRepository".to_string())?,
        })
    }

    fn build_unchecked(self) -> AppUnitOfWork {
        match self.build() {
            Ok(uow) => uow,
            // with_postgres populates every port, so this branch is
            // unreachable from from_postgres.
            Err(missing) => unreachable!("{missing}"),
        }
    }
}
