//! Brute-force lockout.
//!
//! The counter lives on the account row and every change is a single
//! atomic repository call, so concurrent failures never lose an increment.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_database::repositories::AccountRepository;
use salesdesk_entity::account::Account;

/// State after one recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub attempts: i32,
    pub locked: bool,
    pub lock_until: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct LockoutPolicy {
    accounts: Arc<dyn AccountRepository>,
    max_attempts: i32,
    lock_for: Duration,
}

impl std::fmt::Debug for LockoutPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockoutPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("lock_for", &self.lock_for)
            .finish()
    }
}

impl LockoutPolicy {
    pub fn new(accounts: Arc<dyn AccountRepository>, config: &AuthConfig) -> Self {
        Self {
            accounts,
            max_attempts: config.max_failed_attempts.max(1),
            lock_for: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// Count one failed attempt and lock once the threshold is reached.
    pub async fn record_failure(&self, account_id: Uuid) -> AppResult<FailureOutcome> {
        let state = self
            .accounts
            .record_failed_login(account_id, self.max_attempts, self.lock_for)
            .await?
            .ok_or_else(|| user_not_found(account_id))?;

        let locked = state.lock_until.is_some_and(|until| until > Utc::now());
        if locked {
            warn!(
                account_id = %account_id,
                attempts = state.login_attempts,
                "Account locked after repeated failed logins"
            );
        }

        Ok(FailureOutcome {
            attempts: state.login_attempts,
            locked,
            lock_until: state.lock_until,
        })
    }

    /// Zero the counter and clear any lock.
    pub async fn record_success(&self, account_id: Uuid) -> AppResult<()> {
        self.accounts.reset_lockout(account_id).await?;
        Ok(())
    }

    /// Whether a lock is in force. A lock that has run out is reported as
    /// released but stays on the row until the next successful login.
    pub async fn check_locked(&self, account_id: Uuid) -> AppResult<bool> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| user_not_found(account_id))?;
        Ok(Self::is_locked(&account))
    }

    /// Lock check on an already loaded account.
    pub fn is_locked(account: &Account) -> bool {
        account.is_locked_at(Utc::now())
    }

    /// Administrative unlock.
    pub async fn unlock(&self, account_id: Uuid) -> AppResult<()> {
        if !self.accounts.reset_lockout(account_id).await? {
            return Err(user_not_found(account_id));
        }
        Ok(())
    }
}

pub(crate) fn user_not_found(account_id: Uuid) -> AppError {
    AppError::coded(
        ErrorKind::NotFound,
        ErrorCode::UserNotFound,
        format!("User {account_id} not found"),
    )
}
