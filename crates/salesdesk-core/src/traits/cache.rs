//! Cache provider trait for pluggable caching backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for cache backends (Redis or in-memory).
///
/// All values are strings. Every write carries its own TTL and the
/// provider must honor it per entry.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Check whether a key exists in the cache.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Increment a counter by 1 and return the new value. A missing key
    /// starts at 0 and gets `ttl`; an existing key keeps its expiry.
    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
