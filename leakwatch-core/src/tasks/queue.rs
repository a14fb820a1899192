use async_trait::async_trait;

use crate::Result;

use super::job::{TaskHandle, TaskPayload};

/// Abstracts the task queue backend consumed by the fleet orchestrator and
/// the HTTP trigger boundary.
///
/// Delivery semantics are the backend's concern; handlers only assume
/// at-least-once, so every payload's execution path is idempotent. A
/// dispatch error means nothing was enqueued and no state changed.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn dispatch(&self, payload: TaskPayload) -> Result<TaskHandle>;
}
