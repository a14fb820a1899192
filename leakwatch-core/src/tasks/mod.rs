//! Asynchronous task dispatch boundary.
//!
//! Units of work are described by a closed payload enumeration and handed to
//! a [`queue::TaskDispatcher`]. The in-process tokio runtime in `runtime`
//! executes them; a deployment that outgrows one process swaps the
//! dispatcher implementation without touching the payloads or handlers,
//! which stay idempotent under at-least-once delivery either way.

pub mod job;
pub mod queue;
pub mod runtime;

pub use job::{TaskHandle, TaskId, TaskKind, TaskPayload};
pub use queue::TaskDispatcher;
pub use runtime::{TaskExecutor, TaskRuntime, TokioTaskQueue};
