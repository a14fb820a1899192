//! Turns scanner output lines into persisted findings.

use std::sync::Arc;

use tracing::{error, info, warn};

use leakwatch_model::Repo;

use crate::database::ports::scan_results::SecretScanResultRepository;
use crate::scanner::findings::parse_finding_line;

/// Parses finding lines and upserts them under the natural key. Every
/// per-line failure is contained here: a malformed line or a storage error
/// never aborts ingestion of the remaining lines, and scan-level success is
/// judged on the scanner run alone.
pub struct FindingIngester {
    scan_results: Arc<dyn SecretScanResultRepository>,
}

impl std::fmt::Debug for FindingIngester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindingIngester").finish_non_exhaustive()
    }
}

impl FindingIngester {
    pub fn new(scan_results: Arc<dyn SecretScanResultRepository>) -> Self {
        Self { scan_results }
    }

    /// Ingest one scan run's output for `repo`. Returns the number of rows
    /// actually created; re-running over the same output returns 0.
    pub async fn ingest(&self, repo: &Repo, lines: &[String]) -> usize {
        let mut created_count = 0usize;

        for line in lines {
            let finding = match parse_finding_line(line) {
                Ok(Some(finding)) => finding,
                Ok(None) => continue,
                Err(e) => {
                    warn!(repo = %repo, error = %e, "failed to decode finding line");
                    continue;
                }
            };

            let secret_type = finding.secret_type.clone();
            let file_path = finding.file_path.clone();
            let new_result = finding.into_new_result(repo.id);

            match self.scan_results.insert_if_absent(&new_result).await {
                Ok(true) => {
                    created_count += 1;
                    info!(
                        repo = %repo,
                        secret_type = %secret_type,
                        file = %file_path,
                        "created scan result"
                    );
                }
                Ok(false) => {
                    info!(
                        repo = %repo,
                        secret_type = %secret_type,
                        file = %file_path,
                        "scan result already exists"
                    );
                }
                Err(e) => {
                    error!(
                        repo = %repo,
                        secret_type = %secret_type,
                        file = %file_path,
                        error = %e,
                        "error saving scan result"
                    );
                }
            }
        }

        created_count
    }
}
