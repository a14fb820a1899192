mod assets;
mod owners;
mod repos;
mod scan_results;

pub use assets::PostgresAssetRepository;
pub use owners::PostgresRepoOwnerRepository;
pub use repos::PostgresRepoRepository;
pub use scan_results::PostgresSecretScanResultRepository;
