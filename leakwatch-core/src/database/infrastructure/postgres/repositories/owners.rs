use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use leakwatch_model::{NewRepoOwner, OwnerFilter, OwnerId, Page, Platform, RepoOwner};

use crate::database::ports::owners::RepoOwnerRepository;
use crate::error::{Result, ScanError};

#[derive(Clone, Debug)]
pub struct PostgresRepoOwnerRepository {
    pool: PgPool,
}

impl PostgresRepoOwnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const OWNER_COLUMNS: &str =
    "id, name, platform, is_organization, created_at, updated_at";

#[async_trait]
impl RepoOwnerRepository for PostgresRepoOwnerRepository {
    async fn get_owner(&self, id: OwnerId) -> Result<Option<RepoOwner>> {
        let row = sqlx::query_as::<_, OwnerRow>(&format!(
            "SELECT {OWNER_COLUMNS} FROM repo_owners WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to get owner: {e}")))?;

        Ok(row.map(Into::into))
    }

    async fn list_owners(&self, filter: &OwnerFilter, page: Page) -> Result<Vec<RepoOwner>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {OWNER_COLUMNS} FROM repo_owners WHERE 1=1"
        ));

        if let Some(platform) = filter.platform {
            builder.push(" AND platform = ");
            builder.push_bind(platform.as_str());
        }
        if let Some(name) = &filter.name {
            builder.push(" AND name = ");
            builder.push_bind(name.clone());
        }
        if let Some(is_organization) = filter.is_organization {
            builder.push(" AND is_organization = ");
            builder.push_bind(is_organization);
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder
            .build_query_as::<OwnerRow>()
            .fetch_all(self.pool())
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to list owners: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_or_create_owner(&self, new: &NewRepoOwner) -> Result<(RepoOwner, bool)> {
        let inserted = sqlx::query_as::<_, OwnerRow>(&format!(
            r#"
            INSERT INTO repo_owners (id, name, platform, is_organization)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name, platform) DO NOTHING
            RETURNING {OWNER_COLUMNS}
            "#
        ))
        .bind(OwnerId::new().as_uuid())
        .bind(&new.name)
        .bind(new.platform.as_str())
        .bind(new.is_organization)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to create owner: {e}")))?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let existing = sqlx::query_as::<_, OwnerRow>(&format!(
            "SELECT {OWNER_COLUMNS} FROM repo_owners WHERE name = $1 AND platform = $2"
        ))
        .bind(&new.name)
        .bind(new.platform.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to fetch existing owner: {e}")))?;

        Ok((existing.into(), false))
    }

    async fn delete_owner(&self, id: OwnerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM repo_owners WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to delete owner: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_organizations(&self) -> Result<Vec<RepoOwner>> {
        self.list_by_org_flag(true).await
    }

    async fn list_individuals(&self) -> Result<Vec<RepoOwner>> {
        self.list_by_org_flag(false).await
    }
}

impl PostgresRepoOwnerRepository {
    async fn list_by_org_flag(&self, is_organization: bool) -> Result<Vec<RepoOwner>> {
        let rows = sqlx::query_as::<_, OwnerRow>(&format!(
            r#"
            SELECT {OWNER_COLUMNS} FROM repo_owners
            WHERE is_organization = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(is_organization)
        .fetch_all(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to list owners by kind: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    id: Uuid,
    name: String,
    platform: String,
    is_organization: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OwnerRow> for RepoOwner {
    fn from(row: OwnerRow) -> Self {
        RepoOwner {
            id: OwnerId(row.id),
            name: row.name,
            platform: Platform::parse(&row.platform),
            is_organization: row.is_organization,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
