//! Refresh session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One signed-in device: an active refresh token bound to an account.
///
/// Only the SHA-256 digest of the refresh token is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Stable identifier used for listing and targeted revocation.
    pub id: Uuid,
    /// The account this session belongs to.
    pub account_id: Uuid,
    /// Hex SHA-256 digest of the current refresh token.
    #[serde(skip_serializing)]
    pub token_digest: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// Natural expiry of the current refresh token.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        account_id: Uuid,
        token_digest: String,
        metadata: SessionMetadata,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            account_id,
            token_digest,
            user_agent: metadata.user_agent,
            ip_address: metadata.ip_address,
            created_at: now,
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Client details captured at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
