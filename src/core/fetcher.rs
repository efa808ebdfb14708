use crate::core::cache::ReadThroughCache;
use crate::domain::model::{Character, FilmCollection, ResourceKind, Species};
use crate::utils::error::{RankError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Builds the HTTP client shared by the fetcher and the export sink.
pub fn build_http_client(request_timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(request_timeout).build()?)
}

/// Fetches upstream resources through the read-through cache.
///
/// Payloads are checked against the minimal shape for their kind, but the
/// unmodified JSON is what gets cached and returned. Cache hits are trusted
/// and not re-validated.
pub struct ResourceFetcher {
    client: Client,
    cache: ReadThroughCache,
    films_url: String,
}

impl ResourceFetcher {
    pub fn new(client: Client, cache: ReadThroughCache, api_base_url: &str) -> Self {
        Self {
            client,
            cache,
            films_url: format!("{}/films", api_base_url.trim_end_matches('/')),
        }
    }

    pub fn films_url(&self) -> &str {
        &self.films_url
    }

    pub async fn fetch_films(&self, use_cache: bool) -> Result<Value> {
        let url = self.films_url.clone();
        self.fetch(ResourceKind::FilmList, &url, use_cache).await
    }

    pub async fn fetch(&self, kind: ResourceKind, locator: &str, use_cache: bool) -> Result<Value> {
        let cache_key = kind.cache_key(locator);

        if use_cache {
            if let Some(bytes) = self.cache.read(&cache_key).await? {
                tracing::debug!("Cache hit for {} data: {}", kind, locator);
                return Ok(serde_json::from_slice(&bytes)?);
            }
        }

        tracing::info!("Fetching {}: {}", kind, locator);
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| RankError::upstream(kind, format!("{}: {}", locator, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Upstream returned {} for {}", status, locator);
            return Err(RankError::upstream(
                kind,
                format!("{} returned {}", locator, status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RankError::upstream(kind, format!("{}: {}", locator, e)))?;
        let data: Value = serde_json::from_slice(&body)
            .map_err(|e| RankError::shape(kind, format!("{}: {}", locator, e)))?;

        validate_shape(kind, &data).map_err(|e| {
            tracing::error!("Invalid {} payload from {}: {}", kind, locator, e);
            e
        })?;

        if use_cache {
            self.cache.write(&cache_key, &serde_json::to_vec(&data)?).await?;
        }

        Ok(data)
    }
}

/// Checks `data` deserializes into the typed shape for `kind`; the typed value is dropped.
pub fn validate_shape(kind: ResourceKind, data: &Value) -> Result<()> {
    let checked = match kind {
        ResourceKind::FilmList => FilmCollection::deserialize(data).map(|_| ()),
        ResourceKind::Character => Character::deserialize(data).map(|_| ()),
        ResourceKind::Species => Species::deserialize(data).map(|_| ()),
    };
    checked.map_err(|e| RankError::shape(kind, e.to_string()))
}
