//! Revoked refresh token record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A refresh token that must never be accepted again.
///
/// Kept until the token would have expired on its own; after that the
/// entry is inert and the store may drop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedToken {
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn new(token_digest: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_digest: token_digest.into(),
            expires_at,
            revoked_at: Utc::now(),
        }
    }

    /// Remaining natural lifetime in whole seconds, never negative.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}
