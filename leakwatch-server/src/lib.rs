//! HTTP API and wiring for the Leakwatch secret-scanning platform.

pub mod errors;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use errors::{AppError, AppResult};
pub use infra::app_state::AppState;
