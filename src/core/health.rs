use crate::domain::ports::{CacheStore, ConfigProvider};
use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_NAME: &str = "Fancy Star Wars API Service";
pub const DEFAULT_DESCRIPTION: &str =
    "Ranks the Star Wars characters that appear in the most films, sorted by height.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub app: String,
    pub cache: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.cache == "connected"
    }
}

pub async fn health_check(cache: &dyn CacheStore) -> HealthReport {
    let cache_status = match cache.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Cache store ping failed: {}", e);
            "disconnected"
        }
    };

    HealthReport {
        app: "up".to_string(),
        cache: cache_status.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            description: Some(DEFAULT_DESCRIPTION.to_string()),
            author: None,
        }
    }
}

impl AppInfo {
    /// Describes the running configuration in one line for startup logs.
    pub fn banner(&self, config: &dyn ConfigProvider) -> String {
        format!(
            "{} {} (upstream: {}, top {}, {} workers, cache TTL {}s)",
            self.name,
            self.version.as_deref().unwrap_or("dev"),
            config.api_base_url(),
            config.top_n(),
            config.max_concurrent_workers(),
            config.cache_ttl_seconds()
        )
    }
}
