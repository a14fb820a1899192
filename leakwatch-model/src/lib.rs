//! Core data model definitions shared across Leakwatch crates.
#![allow(missing_docs)]

pub mod asset;
pub mod filter_types;
pub mod ids;
pub mod owner;
pub mod platform;
pub mod repo;
pub mod scan_result;

// Intentionally curated re-exports for downstream consumers.
pub use asset::{Asset, AssetStatus, NewVulnerability, Severity, Vulnerability, VulnerabilityState};
pub use filter_types::{OwnerFilter, Page, RepoFilter, ScanResultFilter};
pub use ids::{AssetId, OwnerId, RepoId, ScanResultId, VulnerabilityId};
pub use owner::{NewRepoOwner, RepoOwner};
pub use platform::Platform;
pub use repo::{NewRepo, Repo, ScanState};
pub use scan_result::{NewSecretScanResult, SecretScanResult};
