//! GitHub App implementation of the [`ForgeClient`] port.
//!
//! Authentication follows the GitHub App flow: a short-lived RS256 JWT
//! signed with the app's private key is exchanged for an installation access
//! token, which is cached until shortly before its expiry. The same token is
//! what the scan coordinator embeds into authenticated clone URLs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, ScanError};

use super::{ForgeClient, RemoteRepo, RemoteUser};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;

/// Refresh the installation token this long before GitHub expires it.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Credentials for one GitHub App installation.
#[derive(Clone)]
pub struct GithubAppConfig {
    pub app_id: String,
    pub installation_id: u64,
    pub private_key_pem: String,
    pub user_agent: String,
}

impl std::fmt::Debug for GithubAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubAppConfig")
            .field("app_id", &self.app_id)
            .field("installation_id", &self.installation_id)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct AppJwtClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now()
    }
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    clone_url: String,
    ssh_url: String,
    name: String,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    private: bool,
    /// Repository size as reported by GitHub, already in kilobytes.
    #[serde(default)]
    size: i32,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubCommit {
    sha: String,
}

/// GitHub REST client authenticated as an app installation.
pub struct GithubAppClient {
    http: reqwest::Client,
    api_base: String,
    config: GithubAppConfig,
    signing_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for GithubAppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubAppClient")
            .field("api_base", &self.api_base)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GithubAppClient {
    pub fn new(config: GithubAppConfig) -> Result<Self> {
        Self::with_api_base(config, GITHUB_API_BASE)
    }

    /// Point the client at a different API root. Exists for GitHub
    /// Enterprise deployments and for tests against a local stub.
    pub fn with_api_base(config: GithubAppConfig, api_base: impl Into<String>) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())
            .map_err(|e| ScanError::Forge(format!("invalid GitHub App private key: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ScanError::Forge(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            config,
            signing_key,
            token: Mutex::new(None),
        })
    }

    /// Mint the app-level JWT used to request installation tokens. Issued-at
    /// is backdated 60s to absorb clock skew between us and GitHub.
    fn app_jwt(&self) -> Result<String> {
        let now = Utc::now();
        let claims = AppJwtClaims {
            iat: (now - Duration::seconds(60)).timestamp(),
            exp: (now + Duration::minutes(9)).timestamp(),
            iss: self.config.app_id.clone(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| ScanError::Forge(format!("failed to sign app JWT: {e}")))
    }

    async fn installation_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let jwt = self.app_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, self.config.installation_id
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(jwt)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| ScanError::Forge(format!("installation token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ScanError::Forge(format!(
                "installation token request returned {}",
                response.status()
            )));
        }

        let issued: InstallationTokenResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Forge(format!("malformed installation token response: {e}")))?;

        debug!(expires_at = %issued.expires_at, "issued GitHub installation token");

        let token = CachedToken {
            value: issued.token,
            expires_at: issued.expires_at,
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// One authenticated GET, decoded as JSON.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.installation_token().await?;
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| ScanError::Forge(format!("GitHub API call failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScanError::NotFound(format!("GitHub resource not found: {url}")));
        }
        if !status.is_success() {
            return Err(ScanError::Forge(format!(
                "GitHub API returned {status} for {url}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ScanError::Forge(format!("malformed GitHub response: {e}")))
    }

    /// Drain a paginated listing endpoint. `path` must already carry its
    /// query separator (`?`) since `per_page`/`page` are appended.
    async fn get_paginated<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}{}per_page={}&page={}",
                self.api_base, path, PER_PAGE, page
            );
            let batch: Vec<T> = self.get_json(&url).await?;
            let len = batch.len();
            out.extend(batch);
            if len < PER_PAGE as usize {
                break;
            }
            page += 1;
        }
        Ok(out)
    }
}

#[async_trait]
impl ForgeClient for GithubAppClient {
    async fn list_repos(&self, owner_name: &str) -> Result<Vec<RemoteRepo>> {
        let repos: Vec<GithubRepo> = self
            .get_paginated(&format!("/users/{owner_name}/repos?"))
            .await?;
        Ok(repos
            .into_iter()
            .map(|r| RemoteRepo {
                clone_url: r.clone_url,
                ssh_url: r.ssh_url,
                name: r.name,
                fork: r.fork,
                private: r.private,
                size_kb: r.size,
            })
            .collect())
    }

    async fn list_members(&self, org_name: &str) -> Result<Vec<RemoteUser>> {
        let members: Vec<GithubUser> = self
            .get_paginated(&format!("/orgs/{org_name}/members?"))
            .await?;
        Ok(members
            .into_iter()
            .map(|m| RemoteUser { login: m.login })
            .collect())
    }

    async fn issue_token(&self) -> Result<String> {
        self.installation_token().await
    }

    async fn latest_commit(
        &self,
        owner_name: &str,
        repo_name: &str,
        until: DateTime<Utc>,
    ) -> Result<String> {
        let url = format!(
            "{}/repos/{owner_name}/{repo_name}/commits?until={}&per_page=1",
            self.api_base,
            until.to_rfc3339()
        );
        let commits: Vec<GithubCommit> = self.get_json(&url).await?;
        commits
            .into_iter()
            .next()
            .map(|c| c.sha)
            .ok_or_else(|| {
                ScanError::Forge(format!(
                    "no commits on {owner_name}/{repo_name} at or before {until}"
                ))
            })
    }
}
