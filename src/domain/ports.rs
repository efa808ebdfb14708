use crate::domain::model::CharacterSummary;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key/value store with per-key expiry. Absent and expired keys both read as `None`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ExportReceipt {
    pub path: String,
    pub rows: usize,
    pub forwarded: bool,
    pub exported_at: DateTime<Utc>,
}

#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export(&self, summaries: &[CharacterSummary]) -> Result<ExportReceipt>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Location of `path` as seen by the outside world.
    fn locate(&self, path: &str) -> String;
}

/// How the pipeline reacts when the cache store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFailurePolicy {
    /// Treat the failure as a miss (or a skipped write) and carry on uncached.
    #[default]
    Degrade,
    /// Abort the run with `CacheUnavailable`.
    Fail,
}

impl std::str::FromStr for CacheFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrade" => Ok(CacheFailurePolicy::Degrade),
            "fail" => Ok(CacheFailurePolicy::Fail),
            other => Err(format!("unknown cache failure policy: {}", other)),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn cache_ttl_seconds(&self) -> u64;
    fn max_concurrent_workers(&self) -> usize;
    fn top_n(&self) -> usize;
    fn request_timeout_seconds(&self) -> u64;
    fn cache_failure_policy(&self) -> CacheFailurePolicy;
    fn output_path(&self) -> &str;
    fn export_endpoint(&self) -> Option<&str>;
    fn redis_url(&self) -> Option<&str>;
}
