//! Core library for the Leakwatch secret-scanning platform.
//!
//! This crate owns everything between the HTTP surface and the outside
//! world: the forge (hosting platform) client port, the Postgres-backed
//! repositories and their unit-of-work aggregate, the trufflehog subprocess
//! wrapper and its wire-contract parser, the per-repository scan cycle, the
//! fleet fan-out operations, and the asynchronous task dispatch boundary.
#![allow(missing_docs)]

pub mod application;
pub mod cache;
pub mod database;
pub mod error;
pub mod forge;
pub mod scanner;
pub mod tasks;

pub use error::{Result, ScanError};
