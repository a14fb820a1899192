use serde::{Deserialize, Serialize};

use crate::ids::RepoId;
use crate::platform::Platform;

/// Pagination window for list queries. Defaults mirror the HTTP layer's
/// defaults so repositories can be exercised without a request in front.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(number: Option<u32>, size: Option<u32>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }
}

/// Filterable fields for owner listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerFilter {
    pub platform: Option<Platform>,
    pub name: Option<String>,
    pub is_organization: Option<bool>,
}

/// Filterable fields for repository listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoFilter {
    pub owner: Option<String>,
    pub platform: Option<Platform>,
    pub is_private: Option<bool>,
    pub is_fork: Option<bool>,
}

/// Filterable fields for scan-result listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResultFilter {
    pub repo_id: Option<RepoId>,
    pub secret_type: Option<String>,
    pub is_verified: Option<bool>,
    pub is_false_positive: Option<bool>,
}
