//! In-process execution of dispatched task units.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

use crate::error::{Result, ScanError};
use crate::scanner::coordinator::ScanCoordinator;
use crate::scanner::fleet::FleetOrchestrator;

use super::job::{TaskHandle, TaskId, TaskPayload};
use super::queue::TaskDispatcher;

#[derive(Debug)]
struct TaskEnvelope {
    id: TaskId,
    payload: TaskPayload,
}

/// Channel-backed [`TaskDispatcher`]. Dispatch is non-blocking: a full
/// queue surfaces as a dispatch error to the caller rather than stalling
/// the HTTP request that triggered it.
#[derive(Clone)]
pub struct TokioTaskQueue {
    tx: mpsc::Sender<TaskEnvelope>,
}

impl std::fmt::Debug for TokioTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioTaskQueue")
            .field("capacity", &self.tx.capacity())
            .finish()
    }
}

impl TokioTaskQueue {
    /// Create the queue and the receiver half handed to
    /// [`TaskRuntime::spawn`].
    pub fn channel(depth: usize) -> (Arc<Self>, TaskReceiver) {
        let (tx, rx) = mpsc::channel(depth);
        (Arc::new(Self { tx }), TaskReceiver { rx })
    }
}

#[async_trait]
impl TaskDispatcher for TokioTaskQueue {
    async fn dispatch(&self, payload: TaskPayload) -> Result<TaskHandle> {
        let id = TaskId::new();
        let kind = payload.kind();
        self.tx
            .try_send(TaskEnvelope { id, payload })
            .map_err(|e| ScanError::Dispatch(format!("failed to enqueue {kind}: {e}")))?;
        info!(task_id = %id, %kind, "task dispatched");
        Ok(TaskHandle { id })
    }
}

/// Receiver half of the task channel; consumed once by the runtime.
pub struct TaskReceiver {
    rx: mpsc::Receiver<TaskEnvelope>,
}

impl std::fmt::Debug for TaskReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskReceiver").finish_non_exhaustive()
    }
}

/// Maps task payloads onto the coordinator and fleet orchestrator. One
/// executor is shared by every worker.
pub struct TaskExecutor {
    coordinator: Arc<ScanCoordinator>,
    fleet: Arc<FleetOrchestrator>,
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor").finish_non_exhaustive()
    }
}

impl TaskExecutor {
    pub fn new(coordinator: Arc<ScanCoordinator>, fleet: Arc<FleetOrchestrator>) -> Self {
        Self { coordinator, fleet }
    }

    /// Execute one unit to completion. Outcomes are logged and swallowed:
    /// there is no enclosing handler above the worker loop, and failed units
    /// are retried (if at all) by whoever dispatched them.
    pub async fn execute(&self, id: TaskId, payload: TaskPayload) {
        let kind = payload.kind();
        info!(task_id = %id, %kind, "task started");

        match payload {
            TaskPayload::DiscoverOwnerRepos { owner_id } => {
                let outcome = self.fleet.discover_owner_repos(owner_id).await;
                if !outcome.ok {
                    warn!(task_id = %id, %kind, reason = ?outcome.reason, "task aborted");
                }
            }
            TaskPayload::ScanRepo {
                repo_id,
                concurrency,
                only_verified,
            } => {
                let outcome = self
                    .coordinator
                    .run_cycle(repo_id, concurrency, only_verified)
                    .await;
                if !outcome.ok {
                    warn!(task_id = %id, %kind, reason = ?outcome.reason, "task aborted");
                }
            }
            TaskPayload::SyncOrgMembers => {
                let outcome = self.fleet.sync_org_members().await;
                if !outcome.ok {
                    warn!(task_id = %id, %kind, reason = ?outcome.reason, "task aborted");
                }
            }
            TaskPayload::ScanAllRepos {
                concurrency,
                only_verified,
            } => {
                let outcome = self.fleet.trigger_scan_all(concurrency, only_verified).await;
                info!(task_id = %id, %kind, dispatched = outcome.dispatched, "bulk scan trigger finished");
            }
            TaskPayload::SyncOwnerRepos => {
                let outcome = self.fleet.trigger_owner_sync().await;
                info!(task_id = %id, %kind, dispatched = outcome.dispatched, "bulk owner sync finished");
            }
        }

        info!(task_id = %id, %kind, "task finished");
    }
}

/// Worker pool draining the task channel. Each unit runs linearly to
/// completion on one worker; parallelism across units comes from the worker
/// count, never from suspension inside a unit.
pub struct TaskRuntime {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for TaskRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRuntime")
            .field("workers", &self.handles.len())
            .finish()
    }
}

impl TaskRuntime {
    pub fn spawn(executor: Arc<TaskExecutor>, receiver: TaskReceiver, workers: usize) -> Self {
        let rx = Arc::new(Mutex::new(receiver.rx));
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let rx = rx.clone();
            let executor = executor.clone();
            handles.push(tokio::spawn(async move {
                info!(worker_id, "task worker started");
                loop {
                    // Hold the lock only while receiving so siblings can
                    // pick up the next unit while this one executes.
                    let envelope = { rx.lock().await.recv().await };
                    match envelope {
                        Some(TaskEnvelope { id, payload }) => {
                            executor.execute(id, payload).await;
                        }
                        None => {
                            info!(worker_id, "task channel closed, worker exiting");
                            break;
                        }
                    }
                }
            }));
        }

        info!(workers, "task runtime started");
        Self { handles }
    }

    /// Abort all workers. Used on shutdown after the dispatcher is dropped;
    /// in-flight units are cut off, which the idempotent handlers tolerate.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}
