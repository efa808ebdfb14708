use crate::domain::ports::CacheStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process cache store. Cloning shares the underlying map.
///
/// Expired entries are dropped when read and swept on every write, so keys
/// that are never read again do not accumulate.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| !e.is_expired())
    }

    fn purge_expired(&self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!("Purged {} expired cache entries", purged);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }

        // the read guard is released above; removing while holding it deadlocks
        self.entries.remove_if(key, |_, e| e.is_expired());
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.purge_expired();
        self.entries
            .insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
