pub mod repositories;

pub use repositories::{
    PostgresAssetRepository, PostgresRepoOwnerRepository, PostgresRepoRepository,
    PostgresSecretScanResultRepository,
};
