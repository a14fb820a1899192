use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use leakwatch_model::{NewSecretScanResult, Page, ScanResultFilter, ScanResultId, SecretScanResult};

use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretScanResultRepository: Send + Sync {
    async fn get_result(&self, id: ScanResultId) -> Result<Option<SecretScanResult>>;
    async fn list_results(
        &self,
        filter: &ScanResultFilter,
        page: Page,
    ) -> Result<Vec<SecretScanResult>>;
    /// Insert guarded by the natural key; returns true when a new row was
    /// created, false when an identical finding already existed.
    async fn insert_if_absent(&self, new: &NewSecretScanResult) -> Result<bool>;
    /// Review-workflow mutations; setting `is_rotated` stamps `rotated_at`.
    async fn set_review_flags(
        &self,
        id: ScanResultId,
        is_false_positive: Option<bool>,
        is_rotated: Option<bool>,
    ) -> Result<Option<SecretScanResult>>;
}
