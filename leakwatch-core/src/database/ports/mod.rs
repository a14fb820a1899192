pub mod assets;
pub mod owners;
pub mod repos;
pub mod scan_results;

pub use assets::AssetRepository;
pub use owners::RepoOwnerRepository;
pub use repos::RepoRepository;
pub use scan_results::SecretScanResultRepository;
