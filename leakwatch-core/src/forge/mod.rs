//! Forge (hosting platform) client boundary.
//!
//! The scanning core consumes the platform API through [`ForgeClient`];
//! `github` holds the GitHub App implementation.

pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A repository as reported by the platform's listing endpoint. Field
/// defaults for local `Repo` rows come straight from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRepo {
    pub clone_url: String,
    pub ssh_url: String,
    pub name: String,
    pub fork: bool,
    pub private: bool,
    pub size_kb: i32,
}

impl RemoteRepo {
    pub fn full_name(&self, owner: &str) -> String {
        format!("{}/{}", owner, self.name)
    }
}

/// A platform user, as reported by the organization members endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    pub login: String,
}

/// Read-side capabilities the core needs from a hosting platform.
#[async_trait]
pub trait ForgeClient: Send + Sync {
    /// All repositories belonging to a user or organization.
    async fn list_repos(&self, owner_name: &str) -> Result<Vec<RemoteRepo>>;

    /// All members of an organization.
    async fn list_members(&self, org_name: &str) -> Result<Vec<RemoteUser>>;

    /// A short-lived access token suitable for authenticated clone URLs.
    async fn issue_token(&self) -> Result<String>;

    /// SHA of the newest commit on the repository's default branch at or
    /// before `until`. Bounds the watermark so commits pushed mid-scan are
    /// picked up by the next cycle instead of being skipped.
    async fn latest_commit(
        &self,
        owner_name: &str,
        repo_name: &str,
        until: DateTime<Utc>,
    ) -> Result<String>;
}
