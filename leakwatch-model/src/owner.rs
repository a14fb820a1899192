use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::OwnerId;
use crate::platform::Platform;

/// A user or organization on a hosting platform.
///
/// `name` is unique per platform. Owners are created by admin action or
/// on-demand during organization member sync; they are never deleted by the
/// scanning core (deleting one cascades to its repositories at the storage
/// layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub id: OwnerId,
    pub name: String,
    pub platform: Platform,
    pub is_organization: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Display for RepoOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.platform, self.name)
    }
}

/// Insert shape for [`RepoOwner`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepoOwner {
    pub name: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub is_organization: bool,
}
