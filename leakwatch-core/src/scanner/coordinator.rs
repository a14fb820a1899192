//! One full scan cycle for a single repository.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use leakwatch_model::{Repo, RepoId};

use crate::application::unit_of_work::AppUnitOfWork;
use crate::cache::versions::{CacheVersions, EntityKind};
use crate::forge::ForgeClient;
use crate::scanner::ingest::FindingIngester;
use crate::scanner::outcome::{AbortReason, TaskOutcome};
use crate::scanner::process::SecretScanner;

/// Drives one repository through fetch, credential resolution, scanning,
/// ingestion, and watermark advancement, aborting without side effects on
/// any scan-level failure.
///
/// The cycle is idempotent under task redelivery: a repeated run re-scans
/// the same window (the ingester absorbs the duplicate findings) and leaves
/// the watermark at the same commit or a later one, never an earlier one.
pub struct ScanCoordinator {
    uow: AppUnitOfWork,
    forge: Arc<dyn ForgeClient>,
    scanner: Arc<dyn SecretScanner>,
    versions: Arc<dyn CacheVersions>,
    ingester: FindingIngester,
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator").finish_non_exhaustive()
    }
}

impl ScanCoordinator {
    pub fn new(
        uow: AppUnitOfWork,
        forge: Arc<dyn ForgeClient>,
        scanner: Arc<dyn SecretScanner>,
        versions: Arc<dyn CacheVersions>,
    ) -> Self {
        let ingester = FindingIngester::new(uow.scan_results.clone());
        Self {
            uow,
            forge,
            scanner,
            versions,
            ingester,
        }
    }

    /// Run one scan cycle. Never returns an error: every failure is logged
    /// with full context and reported as a structured outcome, since the
    /// task runner has no enclosing handler.
    pub async fn run_cycle(
        &self,
        repo_id: RepoId,
        concurrency: u32,
        only_verified: bool,
    ) -> TaskOutcome {
        let repo = match self.uow.repos.get_repo(repo_id).await {
            Ok(Some(repo)) => repo,
            Ok(None) => {
                error!(%repo_id, "repo does not exist");
                return TaskOutcome::aborted(AbortReason::RepoNotFound);
            }
            Err(e) => {
                error!(%repo_id, error = %e, "failed to fetch repo");
                return TaskOutcome::aborted(AbortReason::Storage);
            }
        };

        // Single-flight: at most one cycle per repo. Losing the race is a
        // skip, not an error; the winner's cycle covers the same window.
        match self.uow.repos.try_begin_scan(repo.id).await {
            Ok(true) => {}
            Ok(false) => {
                info!(repo = %repo, "scan already in flight, skipping");
                return TaskOutcome::aborted(AbortReason::AlreadyScanning);
            }
            Err(e) => {
                error!(repo = %repo, error = %e, "failed to acquire scan flag");
                return TaskOutcome::aborted(AbortReason::ScanFailed);
            }
        }

        let outcome = self
            .run_cycle_locked(&repo, concurrency, only_verified)
            .await;

        if let Err(e) = self.uow.repos.finish_scan(repo.id).await {
            error!(repo = %repo, error = %e, "failed to release scan flag");
        }

        outcome
    }

    async fn run_cycle_locked(
        &self,
        repo: &Repo,
        concurrency: u32,
        only_verified: bool,
    ) -> TaskOutcome {
        let token = if repo.is_private {
            match self.forge.issue_token().await {
                Ok(token) => token,
                Err(e) => {
                    error!(repo = %repo, error = %e, "failed to resolve scan credentials");
                    return TaskOutcome::aborted(AbortReason::Credentials);
                }
            }
        } else {
            String::new()
        };

        let clone_url = repo.scan_clone_url(&token);
        let since_commit = repo.latest_commit_sha.clone();

        // Captured before the scan starts so commits pushed while the
        // scanner runs fall into the next cycle's window.
        let until = Utc::now();

        info!(
            repo = %repo,
            since_commit = %since_commit,
            concurrency,
            only_verified,
            "scanning repository"
        );

        let run = match self
            .scanner
            .run(&clone_url, &since_commit, concurrency, only_verified)
            .await
        {
            Ok(run) => run,
            Err(e) => {
                error!(repo = %repo, since_commit = %since_commit, error = %e, "scanner invocation failed");
                return TaskOutcome::aborted(AbortReason::ScanFailed);
            }
        };

        if run.failed() {
            error!(
                repo = %repo,
                since_commit = %since_commit,
                exit_ok = run.exit_ok,
                log = %run.log,
                "scan did not complete, leaving watermark untouched"
            );
            return TaskOutcome::aborted(AbortReason::ScanFailed);
        }

        // Ingestion runs regardless of individual line errors; scan-level
        // success was already decided above.
        let created = self.ingester.ingest(repo, &run.lines).await;
        if created > 0 {
            if let Err(e) = self.versions.bump(EntityKind::ScanResults).await {
                warn!(repo = %repo, error = %e, "failed to bump scan-result cache version");
            }
        }

        // Resolving the new watermark is part of the cycle: if it fails we
        // abort with no partial update, and the next run re-covers this
        // window.
        let latest_sha = match self
            .forge
            .latest_commit(&repo.owner_name, &repo.name, until)
            .await
        {
            Ok(sha) => sha,
            Err(e) => {
                error!(repo = %repo, error = %e, "failed to resolve new watermark commit");
                return TaskOutcome::aborted(AbortReason::ScanFailed);
            }
        };

        if let Err(e) = self.uow.repos.advance_watermark(repo.id, &latest_sha).await {
            error!(repo = %repo, latest_sha = %latest_sha, error = %e, "failed to persist watermark");
            return TaskOutcome::aborted(AbortReason::ScanFailed);
        }

        if let Err(e) = self.versions.bump(EntityKind::Repos).await {
            warn!(repo = %repo, error = %e, "failed to bump repo cache version");
        }

        info!(
            repo = %repo,
            findings_created = created,
            watermark = %latest_sha,
            "scan cycle complete"
        );

        TaskOutcome::success()
    }
}
