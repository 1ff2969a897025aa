//! Session lifecycle: login, refresh rotation, logout and request
//! authentication.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::error::{AppError, ErrorCode};
use salesdesk_core::result::AppResult;
use salesdesk_database::repositories::AccountRepository;
use salesdesk_entity::account::{Account, normalize_email};
use salesdesk_entity::audit::{AuditAction, NewAuditEvent};
use salesdesk_entity::session::{Session, SessionMetadata};

use crate::audit::AuditSink;
use crate::lockout::LockoutPolicy;
use crate::password::PasswordHasher;
use crate::principal::Principal;
use crate::revocation::RevocationList;
use crate::token::{IssuedTokens, RefreshToken, TokenService};

use super::registry::SessionRegistry;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub session: Session,
    pub tokens: IssuedTokens,
}

/// Result of a successful refresh: a new access token and the rotated
/// refresh token.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub account_id: Uuid,
    pub session: Session,
    pub tokens: IssuedTokens,
}

#[derive(Clone)]
pub struct SessionManager {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<TokenService>,
    registry: Arc<SessionRegistry>,
    revocations: RevocationList,
    lockout: Arc<LockoutPolicy>,
    hasher: PasswordHasher,
    audit: Arc<dyn AuditSink>,
    require_email_verification: bool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("registry", &self.registry)
            .field("lockout", &self.lockout)
            .field("require_email_verification", &self.require_email_verification)
            .finish()
    }
}

impl SessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<TokenService>,
        registry: Arc<SessionRegistry>,
        revocations: RevocationList,
        lockout: Arc<LockoutPolicy>,
        audit: Arc<dyn AuditSink>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts,
            tokens,
            registry,
            revocations,
            lockout,
            hasher: PasswordHasher::new(),
            audit,
            require_email_verification: config.require_email_verification,
        }
    }

    /// Full login flow:
    ///
    /// 1. Resolve the account by email
    /// 2. Refuse blocked, locked and (optionally) unverified accounts
    /// 3. Verify the password, counting a failure against the lockout
    /// 4. Reset the counter, issue tokens and register the session
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &SessionMetadata,
    ) -> AppResult<LoginOutcome> {
        let email = normalize_email(email);

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            self.audit_failure(None, &email, "unknown_account", client);
            return Err(AppError::invalid_credentials());
        };

        if account.is_blocked {
            self.audit_failure(Some(account.id), &email, "blocked", client);
            return Err(AppError::account_blocked());
        }

        if LockoutPolicy::is_locked(&account) {
            self.audit_failure(Some(account.id), &email, "locked", client);
            return Err(AppError::account_locked());
        }

        if self.require_email_verification && !account.email_verified {
            self.audit_failure(Some(account.id), &email, "email_not_verified", client);
            return Err(AppError::email_not_verified());
        }

        if !self
            .hasher
            .verify_password(password, &account.password_hash)?
        {
            let outcome = self.lockout.record_failure(account.id).await?;
            self.audit_failure(Some(account.id), &email, "invalid_password", client);
            if outcome.locked {
                self.audit.append(
                    NewAuditEvent::new(AuditAction::AccountLocked)
                        .actor(account.id)
                        .target(account.id)
                        .metadata(json!({
                            "attempts": outcome.attempts,
                            "lockUntil": outcome.lock_until,
                        }))
                        .client(client.ip_address.clone(), client.user_agent.clone()),
                );
                return Err(AppError::account_locked());
            }
            return Err(AppError::invalid_credentials());
        }

        self.lockout.record_success(account.id).await?;

        let tokens = self.tokens.issue_pair(account.id)?;
        let added = self
            .registry
            .add(
                account.id,
                &tokens.refresh_token,
                client.clone(),
                tokens.refresh_expires_at,
            )
            .await?;
        for evicted in &added.evicted {
            self.audit.append(
                NewAuditEvent::new(AuditAction::SessionEvicted)
                    .actor(account.id)
                    .target(account.id)
                    .metadata(json!({ "sessionId": evicted.id })),
            );
        }

        let now = Utc::now();
        self.accounts.touch_last_login(account.id, now).await?;

        self.audit.append(
            NewAuditEvent::new(AuditAction::LoginSuccess)
                .actor(account.id)
                .target(account.id)
                .metadata(json!({ "sessionId": added.session.id }))
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        info!(account_id = %account.id, session_id = %added.session.id, "Login successful");

        let account = Account {
            login_attempts: 0,
            lock_until: None,
            last_login_at: Some(now),
            ..account
        };

        Ok(LoginOutcome {
            account,
            session: added.session,
            tokens,
        })
    }

    /// Rotate a refresh token.
    ///
    /// 1. A revoked token is a replay: refuse and audit it
    /// 2. Resolve the session; an unknown token is invalid, an expired one expired
    /// 3. Swap the token atomically; losing a concurrent swap is `TOKEN_INVALID`
    /// 4. Revoke the old token and issue a new access token
    pub async fn refresh(&self, raw_token: &str, client: &SessionMetadata) -> AppResult<RefreshOutcome> {
        let old = RefreshToken::from_raw(raw_token);

        if self.revocations.is_revoked(&old).await? {
            warn!("Revoked refresh token presented");
            self.audit.append(
                NewAuditEvent::new(AuditAction::RefreshTokenReuse)
                    .metadata(json!({ "tokenDigest": old.digest() }))
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            );
            return Err(AppError::token_revoked());
        }

        let session = self
            .registry
            .find_by_token(&old)
            .await?
            .ok_or_else(AppError::token_invalid)?;

        if session.is_expired() {
            self.registry.remove(session.account_id, &old).await?;
            return Err(AppError::token_expired());
        }

        let account = self
            .accounts
            .find_by_id(session.account_id)
            .await?
            .ok_or_else(AppError::token_invalid)?;
        if account.is_blocked {
            return Err(AppError::account_blocked());
        }

        let new = self.tokens.rotate(&old);
        let new_expires_at = Utc::now() + self.tokens.refresh_ttl();
        let rotated = match self
            .registry
            .replace(account.id, &old, &new, new_expires_at)
            .await
        {
            Ok(rotated) => rotated,
            Err(e) if e.code == ErrorCode::SessionNotFound => {
                warn!(account_id = %account.id, "Concurrent refresh lost the token swap");
                return Err(AppError::token_invalid());
            }
            Err(e) => return Err(e),
        };

        self.revocations.revoke(&old, session.expires_at).await?;

        let access = self.tokens.issue_access(account.id)?;

        self.audit.append(
            NewAuditEvent::new(AuditAction::TokenRefreshed)
                .actor(account.id)
                .target(account.id)
                .metadata(json!({ "sessionId": rotated.id }))
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        info!(account_id = %account.id, session_id = %rotated.id, "Refresh token rotated");

        Ok(RefreshOutcome {
            account_id: account.id,
            session: rotated,
            tokens: IssuedTokens {
                access_token: access.token,
                access_expires_at: access.expires_at,
                refresh_token: new,
                refresh_expires_at: new_expires_at,
            },
        })
    }

    /// Revoke the presented token and drop its session. Never fails on an
    /// unknown or already revoked token, and leaves other sessions alone.
    /// A cache outage only costs the revocation entry: the session row is
    /// still deleted, so the token can no longer refresh.
    pub async fn logout(&self, raw_token: &str, client: &SessionMetadata) -> AppResult<()> {
        let token = RefreshToken::from_raw(raw_token);
        let session = self.registry.find_by_token(&token).await?;

        let natural_expiry = session
            .as_ref()
            .map(|s| s.expires_at)
            .unwrap_or_else(|| Utc::now() + self.tokens.refresh_ttl());
        if let Err(e) = self.revocations.revoke(&token, natural_expiry).await {
            warn!(error = %e, "Revocation list unavailable, dropping session anyway");
        }

        if let Some(session) = session {
            self.registry.remove(session.account_id, &token).await?;
            self.audit.append(
                NewAuditEvent::new(AuditAction::Logout)
                    .actor(session.account_id)
                    .target(session.account_id)
                    .metadata(json!({ "sessionId": session.id }))
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            );
            info!(account_id = %session.account_id, session_id = %session.id, "Logout completed");
        }

        Ok(())
    }

    /// Sessions of the caller, oldest first.
    pub async fn list_sessions(&self, account_id: Uuid) -> AppResult<Vec<Session>> {
        self.registry.list(account_id).await
    }

    /// Revoke one of the caller's own sessions.
    pub async fn revoke_session(
        &self,
        account_id: Uuid,
        session_id: Uuid,
        client: &SessionMetadata,
    ) -> AppResult<()> {
        self.registry
            .remove_by_id(account_id, session_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;

        self.audit.append(
            NewAuditEvent::new(AuditAction::SessionRevoked)
                .actor(account_id)
                .target(account_id)
                .metadata(json!({ "sessionId": session_id }))
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        Ok(())
    }

    /// Resolve a bearer access token to the calling principal.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<Principal> {
        let claims = self.tokens.verify_access(access_token)?;
        let account = self
            .accounts
            .find_by_id(claims.account_id())
            .await?
            .ok_or_else(AppError::token_invalid)?;
        if account.is_blocked {
            return Err(AppError::account_blocked());
        }
        Ok(Principal::from(&account))
    }

    fn audit_failure(
        &self,
        account_id: Option<Uuid>,
        email: &str,
        reason: &str,
        client: &SessionMetadata,
    ) {
        warn!(email = %email, reason = %reason, "Login failed");
        let mut event = NewAuditEvent::new(AuditAction::LoginFailed)
            .metadata(json!({ "email": email, "reason": reason }))
            .client(client.ip_address.clone(), client.user_agent.clone());
        if let Some(id) = account_id {
            event = event.target(id);
        }
        self.audit.append(event);
    }
}
