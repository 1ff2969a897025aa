//! Revoked refresh tokens.
//!
//! Entries live in the cache under `auth:revoked:{digest}` and expire with
//! the token's remaining natural lifetime, so the list never needs pruning.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use salesdesk_cache::keys;
use salesdesk_cache::provider::CacheManager;
use salesdesk_core::error::AppError;
use salesdesk_core::result::AppResult;
use salesdesk_core::traits::cache::CacheProvider;
use salesdesk_entity::session::RevokedToken;

use crate::token::RefreshToken;

/// Floor for an entry's TTL so a just-expiring token still collides with a racing replay.
const MIN_TTL_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct RevocationList {
    cache: Arc<CacheManager>,
}

impl RevocationList {
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    pub async fn revoke(&self, token: &RefreshToken, natural_expiry: DateTime<Utc>) -> AppResult<()> {
        self.revoke_digest(token.digest(), natural_expiry).await
    }

    /// Revoke by stored digest, for sessions whose raw token is not at hand.
    pub async fn revoke_digest(&self, token_digest: &str, natural_expiry: DateTime<Utc>) -> AppResult<()> {
        let entry = RevokedToken::new(token_digest, natural_expiry);
        let ttl = entry.remaining_seconds(entry.revoked_at).max(MIN_TTL_SECONDS);
        let value = serde_json::to_string(&entry)?;
        self.cache
            .set(
                &keys::revoked_refresh_token(token_digest),
                &value,
                Duration::from_secs(ttl),
            )
            .await
            .map_err(|e| AppError::cache(format!("Failed to revoke refresh token: {e}")))
    }

    pub async fn is_revoked(&self, token: &RefreshToken) -> AppResult<bool> {
        self.cache
            .exists(&keys::revoked_refresh_token(token.digest()))
            .await
    }
}
