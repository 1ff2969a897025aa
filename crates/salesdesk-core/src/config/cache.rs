//! Cache provider configuration.

use serde::{Deserialize, Serialize};

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache provider type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific cache configuration.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// In-memory cache configuration.
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// Redis cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all SalesDesk cache keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// In-memory cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries in the cache.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "salesdesk:".to_string()
}

fn default_max_capacity() -> u64 {
    100_000
}
