//! Per-account set of active refresh sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use salesdesk_core::config::session::SessionConfig;
use salesdesk_core::error::AppError;
use salesdesk_core::result::AppResult;
use salesdesk_database::repositories::SessionRepository;
use salesdesk_entity::session::{Session, SessionMetadata};

use crate::revocation::RevocationList;
use crate::token::RefreshToken;

/// A newly added session and the ones it pushed out.
#[derive(Debug, Clone)]
pub struct AddedSession {
    pub session: Session,
    pub evicted: Vec<Session>,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<dyn SessionRepository>,
    revocations: RevocationList,
    max_per_account: usize,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("max_per_account", &self.max_per_account)
            .finish()
    }
}

impl SessionRegistry {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        revocations: RevocationList,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            revocations,
            max_per_account: config.max_per_account,
        }
    }

    /// Register a session for `token`. Sessions beyond the per-account cap
    /// are evicted oldest first and their tokens revoked.
    pub async fn add(
        &self,
        account_id: Uuid,
        token: &RefreshToken,
        metadata: SessionMetadata,
        expires_at: DateTime<Utc>,
    ) -> AppResult<AddedSession> {
        let mut session = Session::new(
            account_id,
            token.digest().to_string(),
            metadata,
            chrono::Duration::zero(),
        );
        session.expires_at = expires_at;

        let evicted = self
            .sessions
            .insert_capped(session.clone(), self.max_per_account)
            .await?;

        for old in &evicted {
            warn!(
                account_id = %account_id,
                session_id = %old.id,
                "Session limit reached, evicting oldest session"
            );
            self.revocations
                .revoke_digest(&old.token_digest, old.expires_at)
                .await?;
        }

        Ok(AddedSession { session, evicted })
    }

    /// Global lookup; the token itself does not name its account.
    pub async fn find_by_token(&self, token: &RefreshToken) -> AppResult<Option<Session>> {
        self.sessions.find_by_digest(token.digest()).await
    }

    pub async fn find_for_account(
        &self,
        account_id: Uuid,
        token: &RefreshToken,
    ) -> AppResult<Option<Session>> {
        Ok(self
            .find_by_token(token)
            .await?
            .filter(|s| s.account_id == account_id))
    }

    /// Swap `old` for `new` atomically. Fails with `SESSION_NOT_FOUND` if
    /// `old` is no longer active, which is how the loser of a refresh race
    /// finds out.
    pub async fn replace(
        &self,
        account_id: Uuid,
        old: &RefreshToken,
        new: &RefreshToken,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<Session> {
        self.sessions
            .replace_token(account_id, old.digest(), new.digest(), new_expires_at)
            .await?
            .ok_or_else(AppError::session_not_found)
    }

    /// Remove the session holding `token`. Removing twice is not an error.
    pub async fn remove(&self, account_id: Uuid, token: &RefreshToken) -> AppResult<Option<Session>> {
        self.sessions
            .remove_by_digest(account_id, token.digest())
            .await
    }

    /// Targeted revoke from the "my sessions" list.
    pub async fn remove_by_id(&self, account_id: Uuid, session_id: Uuid) -> AppResult<Option<Session>> {
        let removed = self.sessions.remove_by_id(account_id, session_id).await?;
        if let Some(session) = &removed {
            self.revocations
                .revoke_digest(&session.token_digest, session.expires_at)
                .await?;
        }
        Ok(removed)
    }

    /// Oldest first.
    pub async fn list(&self, account_id: Uuid) -> AppResult<Vec<Session>> {
        self.sessions.list_for_account(account_id).await
    }

    /// Drop and revoke every session of an account.
    pub async fn remove_all(&self, account_id: Uuid) -> AppResult<usize> {
        let removed = self.sessions.remove_all(account_id).await?;
        for session in &removed {
            self.revocations
                .revoke_digest(&session.token_digest, session.expires_at)
                .await?;
        }
        if !removed.is_empty() {
            info!(account_id = %account_id, count = removed.len(), "Revoked all sessions");
        }
        Ok(removed.len())
    }

    /// Delete sessions past their natural expiry.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.sessions.purge_expired(Utc::now()).await
    }
}
