use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AssetId, RepoId, VulnerabilityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Active,
    Inactive,
    Deprecated,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Active => "active",
            AssetStatus::Inactive => "inactive",
            AssetStatus::Deprecated => "deprecated",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "inactive" => AssetStatus::Inactive,
            "deprecated" => AssetStatus::Deprecated,
            _ => AssetStatus::Active,
        }
    }
}

/// An attack-surface asset. Repository-derived assets are created alongside
/// the repository row; network assets come from other integrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub domain: String,
    pub ip: Option<String>,
    pub ip_version: Option<String>,
    pub status: AssetStatus,
    pub repo_id: Option<RepoId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Info,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityState {
    Open,
    Fixed,
    Dismissed,
    AutoDismissed,
    FalsePositive,
    Rotated,
    InProgress,
    AcceptedRisk,
}

/// A vulnerability reported against an asset by an external scanning
/// integration (dependabot, code scanning, ...). Unique per
/// `(asset_id, source, external_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: VulnerabilityId,
    pub asset_id: AssetId,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub state: VulnerabilityState,
    pub file_path: Option<String>,
    pub line_number: Option<i64>,
    pub package_name: Option<String>,
    pub affected_version: Option<String>,
    pub fixed_version: Option<String>,
    pub ghsa_id: Option<String>,
    pub cve_ids: Option<Value>,
    pub cwe_ids: Option<Value>,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub references: Option<Value>,
    pub raw_data: Option<Value>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for [`Vulnerability`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVulnerability {
    pub asset_id: AssetId,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub state: VulnerabilityState,
    pub file_path: Option<String>,
    pub line_number: Option<i64>,
    pub package_name: Option<String>,
    pub affected_version: Option<String>,
    pub fixed_version: Option<String>,
    pub ghsa_id: Option<String>,
    pub cve_ids: Option<Value>,
    pub cwe_ids: Option<Value>,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub references: Option<Value>,
    pub raw_data: Option<Value>,
}
