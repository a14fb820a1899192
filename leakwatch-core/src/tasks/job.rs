use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use leakwatch_model::{OwnerId, RepoId};

/// Unique identifier for dispatched task units.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse task categories, mostly for logging and metrics labels.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    DiscoverOwnerRepos,
    ScanRepo,
    SyncOrgMembers,
    ScanAllRepos,
    SyncOwnerRepos,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::DiscoverOwnerRepos => write!(f, "discover_owner_repos"),
            TaskKind::ScanRepo => write!(f, "scan_repo"),
            TaskKind::SyncOrgMembers => write!(f, "sync_org_members"),
            TaskKind::ScanAllRepos => write!(f, "scan_all_repos"),
            TaskKind::SyncOwnerRepos => write!(f, "sync_owner_repos"),
        }
    }
}

/// Structured payload per task kind. A closed enumeration: there is no
/// string-to-task lookup anywhere, so an unknown task name cannot exist past
/// deserialization and argument shapes are checked at compile time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum TaskPayload {
    DiscoverOwnerRepos {
        owner_id: OwnerId,
    },
    ScanRepo {
        repo_id: RepoId,
        concurrency: u32,
        only_verified: bool,
    },
    SyncOrgMembers,
    ScanAllRepos {
        concurrency: u32,
        only_verified: bool,
    },
    SyncOwnerRepos,
}

impl TaskPayload {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskPayload::DiscoverOwnerRepos { .. } => TaskKind::DiscoverOwnerRepos,
            TaskPayload::ScanRepo { .. } => TaskKind::ScanRepo,
            TaskPayload::SyncOrgMembers => TaskKind::SyncOrgMembers,
            TaskPayload::ScanAllRepos { .. } => TaskKind::ScanAllRepos,
            TaskPayload::SyncOwnerRepos => TaskKind::SyncOwnerRepos,
        }
    }
}

/// Acknowledgement returned to the caller on dispatch. The id is opaque;
/// the core does not poll task state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: TaskId,
}
