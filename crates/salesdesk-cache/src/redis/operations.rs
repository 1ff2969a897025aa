//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use salesdesk_core::error::{AppError, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }
}

/// Redis rejects `EX 0`; round sub-second TTLs up.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set_ex(&full_key, value, ttl_secs(ttl))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        // MULTI; SET key 0 EX ttl NX; INCR key; EXEC
        let (_, value): (Option<String>, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&full_key)
            .arg(0)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .arg("NX")
            .incr(&full_key, 1i64)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(value)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
