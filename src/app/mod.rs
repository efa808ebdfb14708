//! Wiring: builds the cache store, fetcher, export sink and pipeline from a
//! `ConfigProvider`. Every collaborator is constructed here and passed down
//! explicitly.

use crate::adapters::{CsvExportSink, MemoryCacheStore};
use crate::config::cli::LocalStorage;
use crate::core::cache::ReadThroughCache;
use crate::core::fetcher::{build_http_client, ResourceFetcher};
use crate::core::pipeline::{AggregationPipeline, PipelineSettings};
use crate::domain::ports::{CacheStore, ConfigProvider};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Redis when a URL is configured, otherwise an in-process store.
pub async fn build_cache_store(config: &dyn ConfigProvider) -> Result<Arc<dyn CacheStore>> {
    match config.redis_url() {
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(crate::adapters::RedisCacheStore::connect(url).await?)),
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(crate::utils::error::RankError::ConfigError {
            message: "redis_url is set but the `redis` feature is not enabled".to_string(),
        }),
        None => Ok(Arc::new(MemoryCacheStore::new())),
    }
}

pub fn build_pipeline(
    config: &dyn ConfigProvider,
    store: Arc<dyn CacheStore>,
) -> Result<AggregationPipeline> {
    let client = build_http_client(Duration::from_secs(config.request_timeout_seconds()))?;
    let cache = ReadThroughCache::new(
        store,
        Duration::from_secs(config.cache_ttl_seconds()),
        config.cache_failure_policy(),
    );

    let fetcher = Arc::new(ResourceFetcher::new(
        client.clone(),
        cache.clone(),
        config.api_base_url(),
    ));
    let sink = CsvExportSink::new(
        LocalStorage::new(config.output_path().to_string()),
        config.export_endpoint().map(str::to_string),
        client,
    );

    Ok(AggregationPipeline::new(
        fetcher,
        cache,
        Arc::new(sink),
        PipelineSettings::from_config(config),
    ))
}
