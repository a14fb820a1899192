//! In-memory fakes behind the repository/dispatch ports, so handler tests
//! run without Postgres, Redis, or a task runtime.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use leakwatch_core::application::unit_of_work::AppUnitOfWorkBuilder;
use leakwatch_core::cache::versions::InMemoryCacheVersions;
use leakwatch_core::database::ports::assets::AssetRepository;
use leakwatch_core::database::ports::owners::RepoOwnerRepository;
use leakwatch_core::database::ports::repos::RepoRepository;
use leakwatch_core::database::ports::scan_results::SecretScanResultRepository;
use leakwatch_core::error::{Result, ScanError};
use leakwatch_core::tasks::job::{TaskHandle, TaskId, TaskPayload};
use leakwatch_core::tasks::queue::TaskDispatcher;
use leakwatch_model::{
    Asset, NewRepo, NewRepoOwner, NewSecretScanResult, OwnerFilter, OwnerId, Page, Platform, Repo,
    RepoFilter, RepoId, RepoOwner, ScanResultFilter, ScanResultId, ScanState, SecretScanResult,
};
use leakwatch_server::infra::app_state::AppState;
use leakwatch_server::infra::config::Config;
use leakwatch_server::routes::create_router;

#[derive(Default)]
pub struct InMemoryOwners {
    pub rows: Mutex<Vec<RepoOwner>>,
}

#[async_trait]
impl RepoOwnerRepository for InMemoryOwners {
    async fn get_owner(&self, id: OwnerId) -> Result<Option<RepoOwner>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn list_owners(&self, filter: &OwnerFilter, _page: Page) -> Result<Vec<RepoOwner>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| filter.platform.is_none_or(|p| o.platform == p))
            .filter(|o| filter.name.as_ref().is_none_or(|n| &o.name == n))
            .cloned()
            .collect())
    }

    async fn get_or_create_owner(&self, new: &NewRepoOwner) -> Result<(RepoOwner, bool)> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter()
            .find(|o| o.name == new.name && o.platform == new.platform)
        {
            return Ok((existing.clone(), false));
        }
        let owner = RepoOwner {
            id: OwnerId::new(),
            name: new.name.clone(),
            platform: new.platform,
            is_organization: new.is_organization,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        rows.push(owner.clone());
        Ok((owner, true))
    }

    async fn delete_owner(&self, id: OwnerId) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|o| o.id != id);
        Ok(rows.len() < before)
    }

    async fn list_organizations(&self) -> Result<Vec<RepoOwner>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.is_organization)
            .cloned()
            .collect())
    }

    async fn list_individuals(&self) -> Result<Vec<RepoOwner>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| !o.is_organization)
            .cloned()
            .collect())
    }
}

/// Repo port stub: handler tests only read.
#[derive(Default)]
pub struct InMemoryRepos {
    pub rows: Mutex<Vec<Repo>>,
}

impl InMemoryRepos {
    pub fn seed(&self, owner: &RepoOwner, name: &str) -> Repo {
        let repo = Repo {
            id: RepoId::new(),
            https_url: format!("https://github.com/{}/{}.git", owner.name, name),
            ssh_url: format!("git@github.com:{}/{}.git", owner.name, name),
            owner_id: owner.id,
            owner_name: owner.name.clone(),
            name: name.to_string(),
            is_fork: false,
            is_private: false,
            size_kb: 1,
            platform: owner.platform,
            latest_commit_sha: String::new(),
            previous_commit_sha: None,
            scan_state: ScanState::Idle,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(repo.clone());
        repo
    }
}

#[async_trait]
impl RepoRepository for InMemoryRepos {
    async fn get_repo(&self, id: RepoId) -> Result<Option<Repo>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_repos(&self, filter: &RepoFilter, _page: Page) -> Result<Vec<Repo>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.owner.as_ref().is_none_or(|o| &r.owner_name == o))
            .filter(|r| filter.is_private.is_none_or(|f| r.is_private == f))
            .cloned()
            .collect())
    }

    async fn all_repos(&self) -> Result<Vec<Repo>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_or_create_repo(&self, _new: &NewRepo) -> Result<(Repo, bool)> {
        Err(ScanError::Internal("not exercised by handler tests".into()))
    }

    async fn advance_watermark(&self, _id: RepoId, _latest_sha: &str) -> Result<()> {
        Ok(())
    }

    async fn try_begin_scan(&self, _id: RepoId) -> Result<bool> {
        Ok(true)
    }

    async fn finish_scan(&self, _id: RepoId) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryScanResults {
    pub rows: Mutex<Vec<SecretScanResult>>,
}

impl InMemoryScanResults {
    pub fn seed(&self, repo_id: RepoId, file_path: &str, secret_type: &str) -> SecretScanResult {
        let row = SecretScanResult {
            id: ScanResultId::new(),
            file_path: file_path.to_string(),
            file_line: Some(1),
            committer_email: Some("dev@example.com".to_string()),
            commit_datetime: Some(Utc::now()),
            is_verified: true,
            repo_id: Some(repo_id),
            secret_type: secret_type.to_string(),
            secret_value: "shhh".to_string(),
            secret_value_rawv2: None,
            additional_info: None,
            is_false_positive: false,
            is_rotated: false,
            rotated_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        row
    }
}

#[async_trait]
impl SecretScanResultRepository for InMemoryScanResults {
    async fn get_result(&self, id: ScanResultId) -> Result<Option<SecretScanResult>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_results(
        &self,
        filter: &ScanResultFilter,
        _page: Page,
    ) -> Result<Vec<SecretScanResult>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.repo_id.is_none_or(|id| r.repo_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&self, _new: &NewSecretScanResult) -> Result<bool> {
        Err(ScanError::Internal("not exercised by handler tests".into()))
    }

    async fn set_review_flags(
        &self,
        id: ScanResultId,
        is_false_positive: Option<bool>,
        is_rotated: Option<bool>,
    ) -> Result<Option<SecretScanResult>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(flag) = is_false_positive {
            row.is_false_positive = flag;
        }
        if let Some(flag) = is_rotated {
            if flag && !row.is_rotated {
                row.rotated_at = Some(Utc::now());
            }
            row.is_rotated = flag;
        }
        Ok(Some(row.clone()))
    }
}

pub struct StubAssets;

#[async_trait]
impl AssetRepository for StubAssets {
    async fn create_for_repo(&self, _repo: &Repo) -> Result<Option<Asset>> {
        Ok(None)
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub dispatched: Mutex<Vec<TaskPayload>>,
    pub fail_all: Mutex<bool>,
}

impl RecordingDispatcher {
    pub fn dispatched_payloads(&self) -> Vec<TaskPayload> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn fail_everything(&self) {
        *self.fail_all.lock().unwrap() = true;
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, payload: TaskPayload) -> Result<TaskHandle> {
        if *self.fail_all.lock().unwrap() {
            return Err(ScanError::Dispatch("queue unavailable".to_string()));
        }
        self.dispatched.lock().unwrap().push(payload);
        Ok(TaskHandle { id: TaskId::new() })
    }
}

/// Fakes plus the router wired over them.
pub struct TestApp {
    pub owners: Arc<InMemoryOwners>,
    pub repos: Arc<InMemoryRepos>,
    pub scan_results: Arc<InMemoryScanResults>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub versions: Arc<InMemoryCacheVersions>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            owners: Arc::new(InMemoryOwners::default()),
            repos: Arc::new(InMemoryRepos::default()),
            scan_results: Arc::new(InMemoryScanResults::default()),
            dispatcher: Arc::new(RecordingDispatcher::default()),
            versions: Arc::new(InMemoryCacheVersions::new()),
        }
    }

    pub fn router(&self) -> Router {
        let uow = AppUnitOfWorkBuilder::new()
            .with_owners(self.owners.clone())
            .with_repos(self.repos.clone())
            .with_scan_results(self.scan_results.clone())
            .with_assets(Arc::new(StubAssets))
            .build()
            .expect("all ports provided");

        let state = AppState {
            uow,
            dispatcher: self.dispatcher.clone(),
            versions: self.versions.clone(),
            response_cache: None,
            config: Arc::new(Config::default()),
        };

        create_router(state)
    }

    pub fn seed_owner(&self, name: &str, is_organization: bool) -> RepoOwner {
        let owner = RepoOwner {
            id: OwnerId::new(),
            name: name.to_string(),
            platform: Platform::Github,
            is_organization,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.owners.rows.lock().unwrap().push(owner.clone());
        owner
    }
}
