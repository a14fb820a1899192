use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use leakwatch_model::{
    NewSecretScanResult, Page, RepoId, ScanResultFilter, ScanResultId, SecretScanResult,
};

use crate::database::ports::scan_results::SecretScanResultRepository;
use crate::error::{Result, ScanError};

#[derive(Clone, Debug)]
pub struct PostgresSecretScanResultRepository {
    pool: PgPool,
}

impl PostgresSecretScanResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const RESULT_COLUMNS: &str = r#"
    id, file_path, file_line, committer_email, commit_datetime, is_verified,
    repo_id, secret_type, secret_value, secret_value_rawv2, additional_info,
    is_false_positive, is_rotated, rotated_at, created_at, updated_at
"#;

#[async_trait]
impl SecretScanResultRepository for PostgresSecretScanResultRepository {
    async fn get_result(&self, id: ScanResultId) -> Result<Option<SecretScanResult>> {
        let row = sqlx::query_as::<_, ScanResultRow>(&format!(
            "SELECT {RESULT_COLUMNS} FROM secret_scan_results WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to get scan result: {e}")))?;

        Ok(row.map(Into::into))
    }

    async fn list_results(
        &self,
        filter: &ScanResultFilter,
        page: Page,
    ) -> Result<Vec<SecretScanResult>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RESULT_COLUMNS} FROM secret_scan_results WHERE 1=1"
        ));

        if let Some(repo_id) = filter.repo_id {
            builder.push(" AND repo_id = ");
            builder.push_bind(repo_id.to_uuid());
        }
        if let Some(secret_type) = &filter.secret_type {
            builder.push(" AND secret_type = ");
            builder.push_bind(secret_type.clone());
        }
        if let Some(is_verified) = filter.is_verified {
            builder.push(" AND is_verified = ");
            builder.push_bind(is_verified);
        }
        if let Some(is_false_positive) = filter.is_false_positive {
            builder.push(" AND is_false_positive = ");
            builder.push_bind(is_false_positive);
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder
            .build_query_as::<ScanResultRow>()
            .fetch_all(self.pool())
            .await
            .map_err(|e| ScanError::Internal(format!("Failed to list scan results: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_if_absent(&self, new: &NewSecretScanResult) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO secret_scan_results (
                id, file_path, file_line, committer_email, commit_datetime,
                is_verified, repo_id, secret_type, secret_value,
                secret_value_rawv2, additional_info
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT ON CONSTRAINT uq_secret_scan_results_natural DO NOTHING
            "#,
        )
        .bind(ScanResultId::new().as_uuid())
        .bind(&new.file_path)
        .bind(new.file_line)
        .bind(&new.committer_email)
        .bind(new.commit_datetime)
        .bind(new.is_verified)
        .bind(new.repo_id.map(|id| id.to_uuid()))
        .bind(&new.secret_type)
        .bind(&new.secret_value)
        .bind(&new.secret_value_rawv2)
        .bind(&new.additional_info)
        .execute(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to insert scan result: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_review_flags(
        &self,
        id: ScanResultId,
        is_false_positive: Option<bool>,
        is_rotated: Option<bool>,
    ) -> Result<Option<SecretScanResult>> {
        let row = sqlx::query_as::<_, ScanResultRow>(&format!(
            r#"
            UPDATE secret_scan_results
            SET is_false_positive = COALESCE($1, is_false_positive),
                is_rotated = COALESCE($2, is_rotated),
                rotated_at = CASE
                    WHEN $2 IS TRUE AND NOT is_rotated THEN NOW()
                    WHEN $2 IS FALSE THEN NULL
                    ELSE rotated_at
                END,
                updated_at = NOW()
            WHERE id = $3
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(is_false_positive)
        .bind(is_rotated)
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to update review flags: {e}")))?;

        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct ScanResultRow {
    id: Uuid,
    file_path: String,
    file_line: Option<i64>,
    committer_email: Option<String>,
    commit_datetime: Option<DateTime<Utc>>,
    is_verified: bool,
    repo_id: Option<Uuid>,
    secret_type: String,
    secret_value: String,
    secret_value_rawv2: Option<String>,
    additional_info: Option<Value>,
    is_false_positive: bool,
    is_rotated: bool,
    rotated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ScanResultRow> for SecretScanResult {
    fn from(row: ScanResultRow) -> Self {
        SecretScanResult {
            id: ScanResultId(row.id),
            file_path: row.file_path,
            file_line: row.file_line,
            committer_email: row.committer_email,
            commit_datetime: row.commit_datetime,
            is_verified: row.is_verified,
            repo_id: row.repo_id.map(RepoId),
            secret_type: row.secret_type,
            secret_value: row.secret_value,
            secret_value_rawv2: row.secret_value_rawv2,
            additional_info: row.additional_info,
            is_false_positive: row.is_false_positive,
            is_rotated: row.is_rotated,
            rotated_at: row.rotated_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
