//! Scan orchestration: the trufflehog subprocess wrapper, the wire-contract
//! parser, finding ingestion, the per-repository scan cycle, and the fleet
//! fan-out operations.

pub mod coordinator;
pub mod findings;
pub mod fleet;
pub mod ingest;
pub mod outcome;
pub mod process;

pub use coordinator::ScanCoordinator;
pub use fleet::FleetOrchestrator;
pub use ingest::FindingIngester;
pub use outcome::{AbortReason, BulkOutcome, TaskOutcome};
pub use process::{ScanRun, SecretScanner, TrufflehogScanner};
