use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use leakwatch_model::{Asset, AssetId, AssetStatus, Repo, RepoId};

use crate::database::ports::assets::AssetRepository;
use crate::error::{Result, ScanError};

#[derive(Clone, Debug)]
pub struct PostgresAssetRepository {
    pool: PgPool,
}

impl PostgresAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for PostgresAssetRepository {
    async fn create_for_repo(&self, repo: &Repo) -> Result<Option<Asset>> {
        let domain = Url::parse(&repo.https_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let row = sqlx::query_as::<_, AssetRow>(
            r#"
            INSERT INTO assets (id, name, domain, status, repo_id)
            VALUES ($1, $2, $3, 'active', $4)
            ON CONFLICT (repo_id) DO NOTHING
            RETURNING id, name, domain, ip, ip_version, status, repo_id,
                      created_at, updated_at
            "#,
        )
        .bind(AssetId::new().as_uuid())
        .bind(repo.full_name())
        .bind(domain)
        .bind(repo.id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to create repo asset: {e}")))?;

        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    domain: String,
    ip: Option<String>,
    ip_version: Option<String>,
    status: String,
    repo_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: AssetId(row.id),
            name: row.name,
            domain: row.domain,
            ip: row.ip,
            ip_version: row.ip_version,
            status: AssetStatus::parse(&row.status),
            repo_id: row.repo_id.map(RepoId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
