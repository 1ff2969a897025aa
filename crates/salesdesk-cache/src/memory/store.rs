//! In-memory cache implementation using the moka crate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;

use salesdesk_core::config::cache::MemoryCacheConfig;
use salesdesk_core::result::AppResult;
use salesdesk_core::traits::cache::CacheProvider;

/// Expires every entry after the TTL it was written with, restarting on
/// overwrite. Only presence is ever checked, so the TTL is the stored value.
struct PerEntryTtl;

impl Expiry<String, Duration> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, ttl: &Duration, _created_at: Instant) -> Option<Duration> {
        Some(*ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        ttl: &Duration,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(*ttl)
    }
}

/// Counter value and the instant its window closes.
#[derive(Debug, Clone, Copy)]
struct Counter {
    value: i64,
    expires_at: Instant,
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, Duration>,
    /// Counters stored separately so incr can run under the map's entry lock.
    counters: Arc<DashMap<String, Counter>>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            counters: Arc::new(DashMap::new()),
        }
    }

    fn live_counter(&self, key: &str) -> Option<i64> {
        let now = Instant::now();
        self.counters
            .get(key)
            .filter(|c| c.expires_at > now)
            .map(|c| c.value)
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn set(&self, key: &str, _value: &str, ttl: Duration) -> AppResult<()> {
        self.cache.insert(key.to_string(), ttl).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.get(key).await.is_some() || self.live_counter(key).is_some())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let now = Instant::now();
        let mut counter = self.counters.entry(key.to_string()).or_insert(Counter {
            value: 0,
            expires_at: now + ttl,
        });
        if counter.expires_at <= now {
            *counter = Counter {
                value: 0,
                expires_at: now + ttl,
            };
        }
        counter.value += 1;
        Ok(counter.value)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 })
    }

    #[tokio::test]
    async fn test_set_then_exists() {
        let provider = make_provider();
        assert!(!provider.exists("key1").await.unwrap());
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(provider.exists("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_honor_their_own_ttl() {
        let provider = make_provider();
        provider
            .set("short", "v", Duration::from_millis(50))
            .await
            .unwrap();
        provider
            .set("long", "v", Duration::from_secs(60))
            .await
            .unwrap();

        std::thread::sleep(Duration::from_millis(120));

        assert!(!provider.exists("short").await.unwrap());
        assert!(provider.exists("long").await.unwrap());
    }

    #[tokio::test]
    async fn test_incr_is_windowed() {
        let provider = make_provider();
        let window = Duration::from_millis(50);
        assert_eq!(provider.incr("counter", window).await.unwrap(), 1);
        assert_eq!(provider.incr("counter", window).await.unwrap(), 2);
        assert!(provider.exists("counter").await.unwrap());

        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(provider.incr("counter", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let provider = make_provider();
        assert!(provider.health_check().await.unwrap());
    }
}
