//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use salesdesk_core::config::cache::CacheConfig;
use salesdesk_core::error::AppError;
use salesdesk_core::result::AppResult;
use salesdesk_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// An in-memory manager with default capacity.
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        Self::from_provider(Arc::new(crate::memory::MemoryCacheProvider::new(
            &Default::default(),
        )))
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        self.inner.incr(key, ttl).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
