use crate::domain::ports::{CacheFailurePolicy, CacheStore};
use crate::utils::error::{RankError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Read-through view over a shared `CacheStore`: one TTL for every entry and a
/// policy for what a store error means to the run.
#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    policy: CacheFailurePolicy,
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, policy: CacheFailurePolicy) -> Self {
        Self { store, ttl, policy }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.store.get(key).await {
            Ok(value) => Ok(value),
            Err(e) => self.on_failure("read", key, e).map(|_| None),
        }
    }

    pub async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        match self.store.set_with_ttl(key, value, self.ttl).await {
            Ok(()) => {
                tracing::debug!("Cache set for {} with TTL: {:?}", key, self.ttl);
                Ok(())
            }
            Err(e) => self.on_failure("write", key, e),
        }
    }

    fn on_failure(&self, op: &str, key: &str, error: RankError) -> Result<()> {
        let message = match error {
            RankError::CacheUnavailable { message } => message,
            other => other.to_string(),
        };

        match self.policy {
            CacheFailurePolicy::Degrade => {
                tracing::warn!("Cache {} for {} failed, continuing uncached: {}", op, key, message);
                Ok(())
            }
            CacheFailurePolicy::Fail => {
                tracing::error!("Cache {} for {} failed: {}", op, key, message);
                Err(RankError::cache(message))
            }
        }
    }
}
