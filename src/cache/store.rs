use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::time::timeout;

use crate::error::AppError;

/// Key-value store with expiring entries. Implemented by redis in
/// production and by an in-memory map in tests.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;
}

pub struct RedisStore {
    client: Arc<RedisClient>,
    op_timeout: Duration,
}

impl RedisStore {
    pub fn new(client: RedisClient, op_timeout: Duration) -> Self {
        Self {
            client: Arc::new(client),
            op_timeout,
        }
    }

    /// Used at startup to log cache readiness.
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        timeout(self.op_timeout, redis::cmd("PING").query_async::<()>(&mut conn))
            .await
            .map_err(|_| {
                tracing::warn!("Redis PING timed out");
                AppError::CacheUnavailable
            })?
            .map_err(|e| {
                tracing::warn!("Redis PING failed: {}", e);
                AppError::CacheUnavailable
            })
    }

    /// Redis rejects an expiry of 0, so sub-second TTLs round up to 1s.
    fn expire_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        timeout(self.op_timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                tracing::warn!("Redis connect timed out");
                AppError::CacheUnavailable
            })?
            .map_err(|e| {
                tracing::warn!("Redis connect failed: {}", e);
                AppError::CacheUnavailable
            })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection().await?;
        timeout(self.op_timeout, conn.get(key))
            .await
            .map_err(|_| {
                tracing::warn!("Redis GET {} timed out", key);
                AppError::CacheUnavailable
            })?
            .map_err(|e| {
                tracing::warn!("Redis GET {} failed: {}", key, e);
                AppError::CacheUnavailable
            })
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        timeout(self.op_timeout, conn.set_ex(key, value, Self::expire_secs(ttl)))
            .await
            .map_err(|_| {
                tracing::warn!("Redis SET {} timed out", key);
                AppError::CacheUnavailable
            })?
            .map_err(|e| {
                tracing::warn!("Redis SET {} failed: {}", key, e);
                AppError::CacheUnavailable
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_ttl_never_becomes_an_invalid_expire() {
        assert_eq!(RedisStore::expire_secs(Duration::from_millis(500)), 1);
        assert_eq!(RedisStore::expire_secs(Duration::from_secs(1)), 1);
        assert_eq!(RedisStore::expire_secs(Duration::from_secs(60)), 60);
    }
}

/// In-memory store with real TTL semantics, for tests.
#[cfg(test)]
pub struct MemoryStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, (String, std::time::Instant)>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| std::time::Instant::now() < *expires_at)
            .map(|(value, _)| value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            (value.to_string(), std::time::Instant::now() + ttl),
        );
        Ok(())
    }
}
