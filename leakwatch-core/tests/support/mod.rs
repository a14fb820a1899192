//! In-memory fakes for exercising orchestration without Postgres, Redis,
//! the network, or a scanner binary.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use leakwatch_core::database::ports::assets::AssetRepository;
use leakwatch_core::database::ports::owners::RepoOwnerRepository;
use leakwatch_core::database::ports::repos::RepoRepository;
use leakwatch_core::database::ports::scan_results::SecretScanResultRepository;
use leakwatch_core::error::{Result, ScanError};
use leakwatch_core::forge::{ForgeClient, RemoteRepo, RemoteUser};
use leakwatch_core::scanner::process::{ScanRun, SecretScanner};
use leakwatch_core::tasks::job::{TaskHandle, TaskId, TaskPayload};
use leakwatch_core::tasks::queue::TaskDispatcher;
use leakwatch_model::{
    Asset, AssetId, AssetStatus, NewRepo, NewRepoOwner, NewSecretScanResult, OwnerFilter, OwnerId,
    Page, Platform, Repo, RepoFilter, RepoId, RepoOwner, ScanResultFilter, ScanResultId, ScanState,
    SecretScanResult,
};

fn now() -> DateTime<Utc> {
    Utc::now()
}

// ---------------------------------------------------------------------------
// Storage fakes

#[derive(Default)]
pub struct InMemoryOwners {
    pub rows: Mutex<Vec<RepoOwner>>,
}

impl InMemoryOwners {
    pub fn seed(&self, name: &str, platform: Platform, is_organization: bool) -> RepoOwner {
        let owner = RepoOwner {
            id: OwnerId::new(),
            name: name.to_string(),
            platform,
            is_organization,
            created_at: now(),
            updated_at: now(),
        };
        self.rows.lock().unwrap().push(owner.clone());
        owner
    }
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
            .filter(|o| {
                filter
                    .is_organization
                    .is_none_or(|flag| o.is_organization == flag)
            })
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
            created_at: now(),
            updated_at: now(),
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

#[derive(Default)]
pub struct InMemoryRepos {
    pub rows: Mutex<Vec<Repo>>,
}

impl InMemoryRepos {
    pub fn seed(&self, owner: &RepoOwner, name: &str, latest_commit_sha: &str) -> Repo {
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
            latest_commit_sha: latest_commit_sha.to_string(),
            previous_commit_sha: None,
            scan_state: ScanState::Idle,
            created_at: now(),
            updated_at: now(),
        };
        self.rows.lock().unwrap().push(repo.clone());
        repo
    }

    pub fn get_sync(&self, id: RepoId) -> Repo {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .expect("repo seeded")
    }

    pub fn set_scan_state(&self, id: RepoId, state: ScanState) {
        let mut rows = self.rows.lock().unwrap();
        let repo = rows.iter_mut().find(|r| r.id == id).expect("repo seeded");
        repo.scan_state = state;
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
            .filter(|r| filter.platform.is_none_or(|p| r.platform == p))
            .filter(|r| filter.is_private.is_none_or(|f| r.is_private == f))
            .filter(|r| filter.is_fork.is_none_or(|f| r.is_fork == f))
            .cloned()
            .collect())
    }

    async fn all_repos(&self) -> Result<Vec<Repo>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_or_create_repo(&self, new: &NewRepo) -> Result<(Repo, bool)> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|r| {
            r.https_url == new.https_url
                && r.ssh_url == new.ssh_url
                && r.owner_id == new.owner_id
                && r.name == new.name
        }) {
            return Ok((existing.clone(), false));
        }
        let repo = Repo {
            id: RepoId::new(),
            https_url: new.https_url.clone(),
            ssh_url: new.ssh_url.clone(),
            owner_id: new.owner_id,
            // The Postgres repository joins the owner row for this; the
            // fake derives it from the clone URL's path instead.
            owner_name: new
                .https_url
                .trim_end_matches(".git")
                .rsplit('/')
                .nth(1)
                .unwrap_or_default()
                .to_string(),
            name: new.name.clone(),
            is_fork: new.is_fork,
            is_private: new.is_private,
            size_kb: new.size_kb,
            platform: new.platform,
            latest_commit_sha: String::new(),
            previous_commit_sha: None,
            scan_state: ScanState::Idle,
            created_at: now(),
            updated_at: now(),
        };
        rows.push(repo.clone());
        Ok((repo, true))
    }

    async fn advance_watermark(&self, id: RepoId, latest_sha: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let repo = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ScanError::NotFound(format!("repo {id}")))?;
        repo.previous_commit_sha = Some(repo.latest_commit_sha.clone());
        repo.latest_commit_sha = latest_sha.to_string();
        repo.updated_at = now();
        Ok(())
    }

    async fn try_begin_scan(&self, id: RepoId) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let repo = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ScanError::NotFound(format!("repo {id}")))?;
        if repo.scan_state == ScanState::Scanning {
            return Ok(false);
        }
        repo.scan_state = ScanState::Scanning;
        Ok(true)
    }

    async fn finish_scan(&self, id: RepoId) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(repo) = rows.iter_mut().find(|r| r.id == id) {
            repo.scan_state = ScanState::Idle;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryScanResults {
    pub rows: Mutex<Vec<SecretScanResult>>,
}

impl InMemoryScanResults {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

fn natural_key_matches(existing: &SecretScanResult, new: &NewSecretScanResult) -> bool {
    existing.file_path == new.file_path
        && existing.file_line == new.file_line
        && existing.committer_email == new.committer_email
        && existing.commit_datetime == new.commit_datetime
        && existing.is_verified == new.is_verified
        && existing.repo_id == new.repo_id
        && existing.secret_type == new.secret_type
        && existing.secret_value == new.secret_value
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
            .filter(|r| {
                filter
                    .secret_type
                    .as_ref()
                    .is_none_or(|t| &r.secret_type == t)
            })
            .filter(|r| filter.is_verified.is_none_or(|f| r.is_verified == f))
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&self, new: &NewSecretScanResult) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| natural_key_matches(r, new)) {
            return Ok(false);
        }
        rows.push(SecretScanResult {
            id: ScanResultId::new(),
            file_path: new.file_path.clone(),
            file_line: new.file_line,
            committer_email: new.committer_email.clone(),
            commit_datetime: new.commit_datetime,
            is_verified: new.is_verified,
            repo_id: new.repo_id,
            secret_type: new.secret_type.clone(),
            secret_value: new.secret_value.clone(),
            secret_value_rawv2: new.secret_value_rawv2.clone(),
            additional_info: new.additional_info.clone(),
            is_false_positive: false,
            is_rotated: false,
            rotated_at: None,
            created_at: now(),
            updated_at: now(),
        });
        Ok(true)
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
                row.rotated_at = Some(now());
            }
            if !flag {
                row.rotated_at = None;
            }
            row.is_rotated = flag;
        }
        row.updated_at = now();
        Ok(Some(row.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryAssets {
    pub rows: Mutex<Vec<Asset>>,
}

impl InMemoryAssets {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssets {
    async fn create_for_repo(&self, repo: &Repo) -> Result<Option<Asset>> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.repo_id == Some(repo.id)) {
            return Ok(None);
        }
        let asset = Asset {
            id: AssetId::new(),
            name: repo.full_name(),
            domain: "github.com".to_string(),
            ip: None,
            ip_version: None,
            status: AssetStatus::Active,
            repo_id: Some(repo.id),
            created_at: now(),
            updated_at: now(),
        };
        rows.push(asset.clone());
        Ok(Some(asset))
    }
}

// ---------------------------------------------------------------------------
// Forge fake

#[derive(Default)]
pub struct FakeForge {
    pub token: String,
    pub repos_by_owner: Mutex<HashMap<String, Vec<RemoteRepo>>>,
    pub members_by_org: Mutex<HashMap<String, Vec<RemoteUser>>>,
    /// Shas returned by `latest_commit`, consumed front to back; the last
    /// one repeats once the queue drains.
    pub commit_shas: Mutex<VecDeque<String>>,
    pub fail_latest_commit: Mutex<bool>,
}

impl FakeForge {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            ..Self::default()
        }
    }

    pub fn add_remote_repo(&self, owner: &str, name: &str, private: bool) {
        self.repos_by_owner
            .lock()
            .unwrap()
            .entry(owner.to_string())
            .or_default()
            .push(RemoteRepo {
                clone_url: format!("https://github.com/{owner}/{name}.git"),
                ssh_url: format!("git@github.com:{owner}/{name}.git"),
                name: name.to_string(),
                fork: false,
                private,
                size_kb: 42,
            });
    }

    pub fn add_member(&self, org: &str, login: &str) {
        self.members_by_org
            .lock()
            .unwrap()
            .entry(org.to_string())
            .or_default()
            .push(RemoteUser {
                login: login.to_string(),
            });
    }

    pub fn push_commit_sha(&self, sha: &str) {
        self.commit_shas.lock().unwrap().push_back(sha.to_string());
    }

    pub fn set_fail_latest_commit(&self, fail: bool) {
        *self.fail_latest_commit.lock().unwrap() = fail;
    }
}

#[async_trait]
impl ForgeClient for FakeForge {
    async fn list_repos(&self, owner_name: &str) -> Result<Vec<RemoteRepo>> {
        self.repos_by_owner
            .lock()
            .unwrap()
            .get(owner_name)
            .cloned()
            .ok_or_else(|| ScanError::Forge(format!("unknown owner {owner_name}")))
    }

    async fn list_members(&self, org_name: &str) -> Result<Vec<RemoteUser>> {
        self.members_by_org
            .lock()
            .unwrap()
            .get(org_name)
            .cloned()
            .ok_or_else(|| ScanError::Forge(format!("unknown org {org_name}")))
    }

    async fn issue_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn latest_commit(
        &self,
        owner_name: &str,
        repo_name: &str,
        _until: DateTime<Utc>,
    ) -> Result<String> {
        if *self.fail_latest_commit.lock().unwrap() {
            return Err(ScanError::Forge(format!(
                "commit lookup unavailable for {owner_name}/{repo_name}"
            )));
        }
        let mut shas = self.commit_shas.lock().unwrap();
        if shas.len() > 1 {
            Ok(shas.pop_front().expect("nonempty"))
        } else {
            shas.front()
                .cloned()
                .ok_or_else(|| ScanError::Forge("no commit shas scripted".to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner fake

pub struct FakeScanner {
    /// Scripted run results, consumed front to back; the last one repeats.
    pub runs: Mutex<VecDeque<ScanRun>>,
    pub invocations: Mutex<Vec<ScannerInvocation>>,
}

#[derive(Debug, Clone)]
pub struct ScannerInvocation {
    pub clone_url: String,
    pub since_commit: String,
    pub concurrency: u32,
    pub only_verified: bool,
}

impl FakeScanner {
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn push_run(&self, run: ScanRun) {
        self.runs.lock().unwrap().push_back(run);
    }

    pub fn ok_run(lines: Vec<String>) -> ScanRun {
        ScanRun {
            lines,
            log: String::new(),
            exit_ok: true,
        }
    }

    pub fn failed_exit() -> ScanRun {
        ScanRun {
            lines: Vec::new(),
            log: "fatal: could not read from remote repository".to_string(),
            exit_ok: false,
        }
    }

    pub fn error_marker_run() -> ScanRun {
        ScanRun {
            lines: Vec::new(),
            log: "warn: encountered errors during scan".to_string(),
            exit_ok: true,
        }
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn last_invocation(&self) -> ScannerInvocation {
        self.invocations
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("scanner invoked")
    }
}

#[async_trait]
impl SecretScanner for FakeScanner {
    async fn run(
        &self,
        clone_url: &str,
        since_commit: &str,
        concurrency: u32,
        only_verified: bool,
    ) -> Result<ScanRun> {
        self.invocations.lock().unwrap().push(ScannerInvocation {
            clone_url: clone_url.to_string(),
            since_commit: since_commit.to_string(),
            concurrency,
            only_verified,
        });
        let mut runs = self.runs.lock().unwrap();
        if runs.len() > 1 {
            Ok(runs.pop_front().expect("nonempty"))
        } else {
            runs.front()
                .cloned()
                .ok_or_else(|| ScanError::Scanner("no runs scripted".to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher fake

#[derive(Default)]
pub struct RecordingDispatcher {
    pub dispatched: Mutex<Vec<TaskPayload>>,
    /// Repo whose scan dispatch should fail, for isolation tests.
    pub fail_repo: Mutex<Option<RepoId>>,
}

impl RecordingDispatcher {
    pub fn dispatched_payloads(&self) -> Vec<TaskPayload> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn fail_for_repo(&self, id: RepoId) {
        *self.fail_repo.lock().unwrap() = Some(id);
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, payload: TaskPayload) -> Result<TaskHandle> {
        if let TaskPayload::ScanRepo { repo_id, .. } = &payload {
            if *self.fail_repo.lock().unwrap() == Some(*repo_id) {
                return Err(ScanError::Dispatch("queue rejected unit".to_string()));
            }
        }
        self.dispatched.lock().unwrap().push(payload);
        Ok(TaskHandle { id: TaskId::new() })
    }
}

// ---------------------------------------------------------------------------
// Wire-format helper

/// A finding line in the scanner's JSON-lines wire format.
pub fn finding_line(file: &str, line: i64, detector: &str, raw: &str) -> String {
    format!(
        r#"{{"SourceMetadata":{{"Data":{{"Git":{{"commit":"77a2f3f","file":"{file}","email":"dev@example.com","repository":"https://github.com/acme/widget.git","timestamp":"2023-03-03 16:35:43 -0800","line":{line}}}}}}},"SourceID":1,"SourceType":16,"SourceName":"trufflehog - git","DetectorType":2,"DetectorName":"{detector}","DecoderName":"PLAIN","Verified":true,"Raw":"{raw}","RawV2":""}}"#
    )
}

// ---------------------------------------------------------------------------
// Wired-up world

use std::sync::Arc;

use leakwatch_core::application::unit_of_work::{AppUnitOfWork, AppUnitOfWorkBuilder};
use leakwatch_core::cache::versions::InMemoryCacheVersions;
use leakwatch_core::scanner::coordinator::ScanCoordinator;
use leakwatch_core::scanner::fleet::FleetOrchestrator;

/// Everything a test needs, wired over the in-memory fakes.
pub struct World {
    pub owners: Arc<InMemoryOwners>,
    pub repos: Arc<InMemoryRepos>,
    pub scan_results: Arc<InMemoryScanResults>,
    pub assets: Arc<InMemoryAssets>,
    pub forge: Arc<FakeForge>,
    pub scanner: Arc<FakeScanner>,
    pub versions: Arc<InMemoryCacheVersions>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl World {
    pub fn new() -> Self {
        Self {
            owners: Arc::new(InMemoryOwners::default()),
            repos: Arc::new(InMemoryRepos::default()),
            scan_results: Arc::new(InMemoryScanResults::default()),
            assets: Arc::new(InMemoryAssets::default()),
            forge: Arc::new(FakeForge::new("ghs_test_token")),
            scanner: Arc::new(FakeScanner::new()),
            versions: Arc::new(InMemoryCacheVersions::new()),
            dispatcher: Arc::new(RecordingDispatcher::default()),
        }
    }

    pub fn uow(&self) -> AppUnitOfWork {
        AppUnitOfWorkBuilder::new()
            .with_owners(self.owners.clone())
            .with_repos(self.repos.clone())
            .with_scan_results(self.scan_results.clone())
            .with_assets(self.assets.clone())
            .build()
            .expect("all ports provided")
    }

    pub fn coordinator(&self) -> ScanCoordinator {
        ScanCoordinator::new(
            self.uow(),
            self.forge.clone(),
            self.scanner.clone(),
            self.versions.clone(),
        )
    }

    pub fn fleet(&self) -> FleetOrchestrator {
        FleetOrchestrator::new(
            self.uow(),
            self.forge.clone(),
            self.dispatcher.clone(),
            self.versions.clone(),
        )
    }
}
