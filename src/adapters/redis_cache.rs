use crate::domain::ports::CacheStore;
use crate::utils::error::{RankError, Result};
use async_trait::async_trait;
use fred::prelude::*;
use fred::types::Expiration;
use std::time::Duration;

const POOL_SIZE: usize = 4;

/// Cache store backed by a Redis/Valkey connection pool.
pub struct RedisCacheStore {
    pool: Pool,
}

impl RedisCacheStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub async fn connect(redis_url: &str) -> Result<Self> {
        let config = Config::from_url(redis_url).map_err(redis_error)?;
        let pool = Pool::new(config, None, None, None, POOL_SIZE).map_err(redis_error)?;

        pool.connect();
        pool.wait_for_connect().await.map_err(redis_error)?;
        tracing::info!("Connected to cache store at {}", redis_url);

        Ok(Self::new(pool))
    }
}

fn redis_error(e: fred::error::Error) -> RankError {
    RankError::cache(e.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.pool
            .get::<Option<Vec<u8>>, _>(key)
            .await
            .map_err(redis_error)
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        // SET EX rejects a zero expiry
        let seconds = ttl.as_secs().max(1) as i64;
        self.pool
            .set::<(), _, _>(key, value.to_vec(), Some(Expiration::EX(seconds)), None, false)
            .await
            .map_err(redis_error)
    }

    async fn ping(&self) -> Result<()> {
        self.pool
            .ping::<String>(None)
            .await
            .map(|_| ())
            .map_err(redis_error)
    }
}
