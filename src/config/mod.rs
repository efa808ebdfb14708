pub mod cli;
pub mod toml_config;

use crate::domain::ports::{CacheFailurePolicy, ConfigProvider};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url,
};

pub const DEFAULT_API_BASE_URL: &str = "https://swapi.dev/api";
pub const DEFAULT_EXPORT_ENDPOINT: &str = "https://httpbin.org/post";
pub const DEFAULT_OUTPUT_PATH: &str = "./csv";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Checks shared by every `ConfigProvider`.
pub fn validate_provider(config: &dyn ConfigProvider) -> Result<()> {
    validate_url("api_base_url", config.api_base_url())?;
    validate_positive_number("cache_ttl", config.cache_ttl_seconds() as usize, 1)?;
    validate_range("max_concurrent_workers", config.max_concurrent_workers(), 1, 64)?;
    validate_positive_number("top_n", config.top_n(), 1)?;
    validate_range("request_timeout", config.request_timeout_seconds(), 1, 600)?;
    validate_path("output_path", config.output_path())?;
    if let Some(endpoint) = config.export_endpoint() {
        validate_url("export_endpoint", endpoint)?;
    }
    if let Some(redis_url) = config.redis_url() {
        validate_non_empty_string("redis_url", redis_url)?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "swapi-rank")]
#[command(about = "Ranks the Star Wars characters appearing in the most films")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECONDS, help = "Cache TTL in seconds")]
    pub cache_ttl: u64,

    #[arg(long, default_value = "5")]
    pub max_concurrent_workers: usize,

    #[arg(long, default_value = "10")]
    pub top_n: usize,

    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS, help = "Per-request timeout in seconds")]
    pub request_timeout: u64,

    #[arg(long, default_value = "degrade", help = "degrade | fail")]
    pub cache_failure_policy: CacheFailurePolicy,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_EXPORT_ENDPOINT)]
    pub export_endpoint: String,

    #[arg(long, help = "Write the CSV locally without forwarding it")]
    pub no_forward: bool,

    #[arg(long, help = "Redis URL for the cache store (requires the redis feature)")]
    pub redis_url: Option<String>,

    #[arg(long, help = "Bypass the cache for this run")]
    pub no_cache: bool,

    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, help = "Report cache connectivity and exit")]
    pub health_check: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn cache_ttl_seconds(&self) -> u64 {
        self.cache_ttl
    }

    fn max_concurrent_workers(&self) -> usize {
        self.max_concurrent_workers
    }

    fn top_n(&self) -> usize {
        self.top_n
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout
    }

    fn cache_failure_policy(&self) -> CacheFailurePolicy {
        self.cache_failure_policy
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn export_endpoint(&self) -> Option<&str> {
        if self.no_forward || self.export_endpoint.is_empty() {
            None
        } else {
            Some(&self.export_endpoint)
        }
    }

    fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
