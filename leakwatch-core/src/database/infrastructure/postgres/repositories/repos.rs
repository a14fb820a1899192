use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use leakwatch_model::{NewRepo, OwnerId, Page, Platform, Repo, RepoFilter, RepoId, ScanState};

use crate::database::ports::repos::RepoRepository;
use crate::error::{Result, ScanError};

#[derive(Clone, Debug)]
pub struct PostgresRepoRepository {
    pool: PgPool,
}

impl PostgresRepoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Repo rows always join the owner so the model carries `owner_name`.
const REPO_SELECT: &str = r#"
    SELECT
        r.id, r.https_url, r.ssh_url, r.owner_id, o.name AS owner_name,
        r.name, r.is_fork, r.is_private, r.size_kb, r.platform,
        r.latest_commit_sha, r.previous_commit_sha, r.scan_state,
        r.created_at, r.updated_at
    FROM repos r
    JOIN repo_owners o ON o.id = r.owner_id
"#;

#[async_trait]
impl RepoRepository for PostgresRepoRepository {
    async fn get_repo(&self, id: RepoId) -> Result<Option<Repo>> {
        let row = sqlx::query_as::<_, RepoRow>(&format!("{REPO_SELECT} WHERE r.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to get repo: {e}")))?;

        Ok(row.map(Into::into))
    }

    async fn list_repos(&self, filter: &RepoFilter, page: Page) -> Result<Vec<Repo>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("{REPO_SELECT} WHERE 1=1"));

        if let Some(owner) = &filter.owner {
            builder.push(" AND o.name = ");
            builder.push_bind(owner.clone());
        }
        if let Some(platform) = filter.platform {
            builder.push(" AND r.platform = ");
            builder.push_bind(platform.as_str());
        }
        if let Some(is_private) = filter.is_private {
            builder.push(" AND r.is_private = ");
            builder.push_bind(is_private);
        }
        if let Some(is_fork) = filter.is_fork {
            builder.push(" AND r.is_fork = ");
            builder.push_bind(is_fork);
        }

        builder.push(" ORDER BY r.created_at DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder
            .build_query_as::<RepoRow>()
            .fetch_all(self.pool())
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to list repos: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn all_repos(&self) -> Result<Vec<Repo>> {
        let rows = sqlx::query_as::<_, RepoRow>(&format!(
            "{REPO_SELECT} ORDER BY r.created_at DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to list all repos: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_or_create_repo(&self, new: &NewRepo) -> Result<(Repo, bool)> {
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO repos (
                id, https_url, ssh_url, owner_id, name,
                is_fork, is_private, size_kb, platform
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (https_url, ssh_url, owner_id, name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(RepoId::new().as_uuid())
        .bind(&new.https_url)
        .bind(&new.ssh_url)
        .bind(new.owner_id.as_uuid())
        .bind(&new.name)
        .bind(new.is_fork)
        .bind(new.is_private)
        .bind(new.size_kb)
        .bind(new.platform.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to create repo: {e}")))?;

        if let Some(id) = inserted {
            let repo = self
                .get_repo(RepoId(id))
                .await?
                .ok_or_else(|| ScanError::Internal("inserted repo vanished".to_string()))?;
            return Ok((repo, true));
        }

        let row = sqlx::query_as::<_, RepoRow>(&format!(
            r#"{REPO_SELECT}
            WHERE r.https_url = $1 AND r.ssh_url = $2 AND r.owner_id = $3 AND r.name = $4
            "#
        ))
        .bind(&new.https_url)
        .bind(&new.ssh_url)
        .bind(new.owner_id.as_uuid())
        .bind(&new.name)
        .fetch_one(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to fetch existing repo: {e}")))?;

        Ok((row.into(), false))
    }

    async fn advance_watermark(&self, id: RepoId, latest_sha: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE repos
            SET previous_commit_sha = latest_commit_sha,
                latest_commit_sha = $1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(latest_sha)
        .bind(id.as_uuid())
        .execute(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to advance watermark: {e}")))?;

        Ok(())
    }

    async fn try_begin_scan(&self, id: RepoId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE repos
            SET scan_state = 'scanning', updated_at = NOW()
            WHERE id = $1 AND scan_state = 'idle'
            "#,
        )
        .bind(id.as_uuid())
        .execute(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to acquire scan flag: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn finish_scan(&self, id: RepoId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE repos
            SET scan_state = 'idle', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to release scan flag: {e}")))?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RepoRow {
    id: Uuid,
    https_url: String,
    ssh_url: String,
    owner_id: Uuid,
    owner_name: String,
    name: String,
    is_fork: bool,
    is_private: bool,
    size_kb: i32,
    platform: String,
    latest_commit_sha: String,
    previous_commit_sha: Option<String>,
    scan_state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RepoRow> for Repo {
    fn from(row: RepoRow) -> Self {
        Repo {
            id: RepoId(row.id),
            https_url: row.https_url,
            ssh_url: row.ssh_url,
            owner_id: OwnerId(row.owner_id),
            owner_name: row.owner_name,
            name: row.name,
            is_fork: row.is_fork,
            is_private: row.is_private,
            size_kb: row.size_kb,
            platform: Platform::parse(&row.platform),
            latest_commit_sha: row.latest_commit_sha,
            previous_commit_sha: row.previous_commit_sha,
            scan_state: ScanState::parse(&row.scan_state),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
