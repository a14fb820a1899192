use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{RepoId, ScanResultId};

/// One detected secret occurrence.
///
/// Deduplication uses the natural key `(file_path, file_line,
/// committer_email, commit_datetime, is_verified, repo_id, secret_type,
/// secret_value)`: re-ingesting the same tool output never creates a second
/// row. `additional_info` retains the entire parsed tool object so schema
/// additions upstream survive without a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretScanResult {
    pub id: ScanResultId,
    pub file_path: String,
    pub file_line: Option<i64>,
    pub committer_email: Option<String>,
    pub commit_datetime: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub repo_id: Option<RepoId>,
    pub secret_type: String,
    pub secret_value: String,
    pub secret_value_rawv2: Option<String>,
    pub additional_info: Option<Value>,
    pub is_false_positive: bool,
    pub is_rotated: bool,
    pub rotated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Display for SecretScanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretScanResult({}, {})", self.file_path, self.secret_type)
    }
}

/// Insert shape for [`SecretScanResult`]. Carries exactly the natural-key
/// fields plus the retained metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSecretScanResult {
    pub file_path: String,
    pub file_line: Option<i64>,
    pub committer_email: Option<String>,
    pub commit_datetime: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub repo_id: Option<RepoId>,
    pub secret_type: String,
    pub secret_value: String,
    pub secret_value_rawv2: Option<String>,
    pub additional_info: Option<Value>,
}
