//! Fleet-wide fan-out operations.
//!
//! Each operation iterates a collection and either upserts locally or
//! dispatches one independent task per element. One element's failure is
//! logged and never blocks its siblings.

use std::sync::Arc;

use tracing::{error, info, warn};

use leakwatch_model::{NewRepo, NewRepoOwner, OwnerId};

use crate::application::unit_of_work::AppUnitOfWork;
use crate::cache::versions::{CacheVersions, EntityKind};
use crate::forge::ForgeClient;
use crate::scanner::outcome::{AbortReason, BulkOutcome, TaskOutcome};
use crate::tasks::job::TaskPayload;
use crate::tasks::queue::TaskDispatcher;

pub struct FleetOrchestrator {
    uow: AppUnitOfWork,
    forge: Arc<dyn ForgeClient>,
    dispatcher: Arc<dyn TaskDispatcher>,
    versions: Arc<dyn CacheVersions>,
}

impl std::fmt::Debug for FleetOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetOrchestrator").finish_non_exhaustive()
    }
}

impl FleetOrchestrator {
    pub fn new(
        uow: AppUnitOfWork,
        forge: Arc<dyn ForgeClient>,
        dispatcher: Arc<dyn TaskDispatcher>,
        versions: Arc<dyn CacheVersions>,
    ) -> Self {
        Self {
            uow,
            forge,
            dispatcher,
            versions,
        }
    }

    /// Discover and upsert all remote repositories for one owner.
    /// Idempotent: repos already known by their identity key are left
    /// untouched.
    pub async fn discover_owner_repos(&self, owner_id: OwnerId) -> TaskOutcome {
        let owner = match self.uow.owners.get_owner(owner_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                error!(%owner_id, "owner does not exist");
                return TaskOutcome::aborted(AbortReason::OwnerNotFound);
            }
            Err(e) => {
                error!(%owner_id, error = %e, "failed to fetch owner");
                return TaskOutcome::aborted(AbortReason::Storage);
            }
        };

        if !owner.platform.is_supported() {
            info!(owner = %owner, "no integration for platform, skipping discovery");
            return TaskOutcome::success();
        }

        let remote_repos = match self.forge.list_repos(&owner.name).await {
            Ok(repos) => repos,
            Err(e) => {
                error!(owner = %owner, error = %e, "failed to list remote repos");
                return TaskOutcome::aborted(AbortReason::ForgeFailed);
            }
        };

        let mut created_count = 0usize;
        for remote in remote_repos {
            let full_name = remote.full_name(&owner.name);
            let new_repo = NewRepo {
                https_url: remote.clone_url,
                ssh_url: remote.ssh_url,
                owner_id: owner.id,
                name: remote.name,
                is_fork: remote.fork,
                is_private: remote.private,
                size_kb: remote.size_kb,
                platform: owner.platform,
            };

            match self.uow.repos.get_or_create_repo(&new_repo).await {
                Ok((repo, true)) => {
                    created_count += 1;
                    info!(repo = %full_name, "created repo");
                    if let Err(e) = self.uow.assets.create_for_repo(&repo).await {
                        error!(repo = %full_name, error = %e, "error creating repo asset");
                    }
                }
                Ok((repo, false)) => {
                    info!(repo = %full_name, id = %repo.id, "repo already exists");
                }
                Err(e) => {
                    error!(repo = %full_name, error = %e, "error creating repo");
                }
            }
        }

        if created_count > 0 {
            if let Err(e) = self.versions.bump(EntityKind::Repos).await {
                warn!(error = %e, "failed to bump repo cache version");
            }
        }

        info!(owner = %owner, created = created_count, "repo discovery finished");
        TaskOutcome::success()
    }

    /// Upsert every member of every organization-flagged owner as an
    /// individual owner. Organizations on unsupported platforms are skipped
    /// with a note, and one organization's API failure does not stop the
    /// rest.
    pub async fn sync_org_members(&self) -> TaskOutcome {
        let organizations = match self.uow.owners.list_organizations().await {
            Ok(orgs) => orgs,
            Err(e) => {
                error!(error = %e, "failed to list organizations");
                return TaskOutcome::aborted(AbortReason::Storage);
            }
        };

        let mut created_count = 0usize;
        for org in organizations {
            if !org.platform.is_supported() {
                info!(org = %org, "skipping organization on unsupported platform");
                continue;
            }

            let members = match self.forge.list_members(&org.name).await {
                Ok(members) => members,
                Err(e) => {
                    error!(org = %org, error = %e, "failed to list organization members");
                    continue;
                }
            };

            for member in members {
                let new_owner = NewRepoOwner {
                    name: member.login.clone(),
                    platform: org.platform,
                    is_organization: false,
                };

                match self.uow.owners.get_or_create_owner(&new_owner).await {
                    Ok((owner, true)) => {
                        created_count += 1;
                        info!(user = %member.login, id = %owner.id, "created owner for member");
                    }
                    Ok((owner, false)) => {
                        info!(user = %member.login, id = %owner.id, "owner already exists for member");
                    }
                    Err(e) => {
                        error!(user = %member.login, error = %e, "error creating owner for member");
                    }
                }
            }
        }

        if created_count > 0 {
            if let Err(e) = self.versions.bump(EntityKind::Owners).await {
                warn!(error = %e, "failed to bump owner cache version");
            }
        }

        TaskOutcome::success()
    }

    /// Dispatch one scan cycle per tracked repository. Returns how many
    /// units were handed to the dispatcher; a unit that fails to enqueue is
    /// logged and excluded from the count without stopping the iteration.
    pub async fn trigger_scan_all(&self, concurrency: u32, only_verified: bool) -> BulkOutcome {
        let repos = match self.uow.repos.all_repos().await {
            Ok(repos) => repos,
            Err(e) => {
                error!(error = %e, "failed to enumerate repos for bulk scan");
                return BulkOutcome::aborted(AbortReason::Storage);
            }
        };

        let total = repos.len();
        let mut dispatched = 0usize;
        for (index, repo) in repos.into_iter().enumerate() {
            info!(repo = %repo, "triggering scan ({}/{})", index + 1, total);
            let payload = TaskPayload::ScanRepo {
                repo_id: repo.id,
                concurrency,
                only_verified,
            };
            match self.dispatcher.dispatch(payload).await {
                Ok(handle) => {
                    dispatched += 1;
                    info!(repo = %repo, task_id = %handle.id, "scan dispatched");
                }
                Err(e) => {
                    error!(repo = %repo, error = %e, "failed to dispatch scan");
                }
            }
        }

        BulkOutcome::dispatched(dispatched)
    }

    /// Dispatch one repo-discovery unit per non-organization owner.
    pub async fn trigger_owner_sync(&self) -> BulkOutcome {
        let owners = match self.uow.owners.list_individuals().await {
            Ok(owners) => owners,
            Err(e) => {
                error!(error = %e, "failed to enumerate owners for bulk sync");
                return BulkOutcome::aborted(AbortReason::Storage);
            }
        };

        let total = owners.len();
        let mut dispatched = 0usize;
        for (index, owner) in owners.into_iter().enumerate() {
            info!(owner = %owner, "syncing repos ({}/{})", index + 1, total);
            let payload = TaskPayload::DiscoverOwnerRepos { owner_id: owner.id };
            match self.dispatcher.dispatch(payload).await {
                Ok(handle) => {
                    dispatched += 1;
                    info!(owner = %owner, task_id = %handle.id, "discovery dispatched");
                }
                Err(e) => {
                    error!(owner = %owner, error = %e, "failed to dispatch discovery");
                }
            }
        }

        BulkOutcome::dispatched(dispatched)
    }
}
