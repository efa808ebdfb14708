use crate::config::{
    validate_provider, DEFAULT_API_BASE_URL, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_EXPORT_ENDPOINT,
    DEFAULT_OUTPUT_PATH, DEFAULT_REQUEST_TIMEOUT_SECONDS,
};
use crate::core::health::AppInfo;
use crate::core::pipeline::{DEFAULT_MAX_CONCURRENT_WORKERS, DEFAULT_TOP_N};
use crate::domain::ports::{CacheFailurePolicy, ConfigProvider};
use crate::utils::error::{RankError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-based configuration. Every section is optional; `${VAR}` references are
/// replaced from the environment before parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub app: AppSection,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        let info = AppInfo::default();
        Self {
            name: info.name,
            version: info.version,
            description: info.description,
            author: info.author,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub on_failure: CacheFailurePolicy,
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            on_failure: CacheFailurePolicy::default(),
            redis_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub top_n: usize,
    pub max_concurrent_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            max_concurrent_workers: DEFAULT_MAX_CONCURRENT_WORKERS,
        }
    }
}

/// An empty `endpoint` keeps the CSV local.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
    pub endpoint: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            endpoint: Some(DEFAULT_EXPORT_ENDPOINT.to_string()),
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RankError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}`; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RankError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn app_info(&self) -> AppInfo {
        AppInfo {
            name: self.app.name.clone(),
            version: self.app.version.clone(),
            description: self.app.description.clone(),
            author: self.app.author.clone(),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base_url(&self) -> &str {
        &self.upstream.base_url
    }

    fn cache_ttl_seconds(&self) -> u64 {
        self.cache.ttl_seconds
    }

    fn max_concurrent_workers(&self) -> usize {
        self.pipeline.max_concurrent_workers
    }

    fn top_n(&self) -> usize {
        self.pipeline.top_n
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.upstream.timeout_seconds
    }

    fn cache_failure_policy(&self) -> CacheFailurePolicy {
        self.cache.on_failure
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn export_endpoint(&self) -> Option<&str> {
        self.export.endpoint.as_deref().filter(|e| !e.is_empty())
    }

    fn redis_url(&self) -> Option<&str> {
        self.cache.redis_url.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_non_empty_string("app.name", &self.app.name)?;
        validate_provider(self)
    }
}
