use serde::{Deserialize, Serialize};

/// Why a unit of work stopped short of completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    OwnerNotFound,
    RepoNotFound,
    /// Another scan cycle already holds this repo's admission flag.
    AlreadyScanning,
    Credentials,
    /// Scanner exited non-zero, emitted its error marker, or the
    /// post-scan commit resolution failed.
    ScanFailed,
    /// A forge listing call failed before any per-element work started.
    ForgeFailed,
    /// Storage failed before any per-element work started.
    Storage,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AbortReason::OwnerNotFound => "owner_not_found",
            AbortReason::RepoNotFound => "repo_not_found",
            AbortReason::AlreadyScanning => "already_scanning",
            AbortReason::Credentials => "credentials",
            AbortReason::ScanFailed => "scan_failed",
            AbortReason::ForgeFailed => "forge_failed",
            AbortReason::Storage => "storage",
        };
        write!(f, "{s}")
    }
}

/// Structured result of one task unit. These surface only through logs and
/// the dispatch boundary; nothing above the task runner handles them, so
/// units never panic or propagate errors upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub ok: bool,
    pub reason: Option<AbortReason>,
}

impl TaskOutcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn aborted(reason: AbortReason) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

/// Result of a bulk fan-out trigger. `dispatched` counts units successfully
/// handed to the dispatch boundary; per-unit success is only known
/// asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub ok: bool,
    pub dispatched: usize,
    pub reason: Option<AbortReason>,
}

impl BulkOutcome {
    pub fn dispatched(count: usize) -> Self {
        Self {
            ok: true,
            dispatched: count,
            reason: None,
        }
    }

    pub fn aborted(reason: AbortReason) -> Self {
        Self {
            ok: false,
            dispatched: 0,
            reason: Some(reason),
        }
    }
}
