//! In-memory account repository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_entity::account::{Account, CreateAccount, LockoutState, normalize_email};

use crate::repositories::AccountRepository;

#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    accounts: DashMap<Uuid, Account>,
    /// Unique email index. Locked before `accounts` when both are needed.
    emails: DashMap<String, Uuid>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the account under its entry lock.
    fn update<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut Account),
    {
        match self.accounts.get_mut(&id) {
            Some(mut account) => {
                f(&mut account);
                account.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let id = self.emails.get(&normalize_email(email)).map(|id| *id);
        Ok(id.and_then(|id| self.accounts.get(&id).map(|a| a.clone())))
    }

    async fn create(&self, data: CreateAccount) -> AppResult<Account> {
        let account = data.into_account();
        match self.emails.entry(account.email.clone()) {
            Entry::Occupied(_) => Err(AppError::coded(
                ErrorKind::Conflict,
                ErrorCode::EmailAlreadyRegistered,
                "Email is already registered",
            )),
            Entry::Vacant(slot) => {
                self.accounts.insert(account.id, account.clone());
                slot.insert(account.id);
                Ok(account)
            }
        }
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Account>> {
        let mut all: Vec<Account> = self.accounts.iter().map(|a| a.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(PageResponse::from_sorted(all, page))
    }

    async fn record_failed_login(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_for: Duration,
    ) -> AppResult<Option<LockoutState>> {
        let mut state = None;
        self.update(id, |account| {
            account.login_attempts += 1;
            if account.login_attempts >= max_attempts {
                account.lock_until = Some(Utc::now() + lock_for);
            }
            state = Some(LockoutState {
                login_attempts: account.login_attempts,
                lock_until: account.lock_until,
            });
        });
        Ok(state)
    }

    async fn reset_lockout(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.update(id, |account| {
            account.login_attempts = 0;
            account.lock_until = None;
        }))
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.update(id, |account| account.last_login_at = Some(at));
        Ok(())
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> AppResult<bool> {
        Ok(self.update(id, |account| account.is_blocked = blocked))
    }

    async fn set_verification_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.update(id, |account| {
            account.verification_code = Some(code.to_string());
            account.verification_code_expires_at = Some(expires_at);
        });
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> AppResult<()> {
        self.update(id, |account| {
            account.email_verified = true;
            account.verification_code = None;
            account.verification_code_expires_at = None;
        });
        Ok(())
    }

    async fn set_reset_code(
        &self,
        id: Uuid,
        code: Option<(&str, DateTime<Utc>)>,
    ) -> AppResult<()> {
        self.update(id, |account| {
            account.reset_code = code.map(|(c, _)| c.to_string());
            account.reset_code_expires_at = code.map(|(_, at)| at);
            account.reset_code_attempts = 0;
        });
        Ok(())
    }

    async fn record_reset_code_failure(&self, id: Uuid, max_attempts: i32) -> AppResult<Option<i32>> {
        let mut attempts = None;
        self.update(id, |account| {
            account.reset_code_attempts += 1;
            if account.reset_code_attempts >= max_attempts {
                account.reset_code = None;
                account.reset_code_expires_at = None;
            }
            attempts = Some(account.reset_code_attempts);
        });
        Ok(attempts)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let found = self.update(id, |account| {
            account.password_hash = password_hash.to_string();
            account.reset_code = None;
            account.reset_code_expires_at = None;
            account.reset_code_attempts = 0;
        });
        if !found {
            return Err(AppError::not_found(format!("Account {id} not found"))
                .with_code(ErrorCode::UserNotFound));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_account(email: &str) -> CreateAccount {
        CreateAccount {
            name: "Test".into(),
            email: email.into(),
            phone: None,
            password_hash: "hash".into(),
            email_verified: true,
            verification_code: None,
            verification_code_expires_at: None,
            global_roles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = MemoryAccountRepository::new();
        repo.create(new_account("a@example.com")).await.unwrap();
        let err = repo.create(new_account("A@Example.com")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
    }

    #[tokio::test]
    async fn test_lock_set_when_threshold_reached() {
        let repo = MemoryAccountRepository::new();
        let account = repo.create(new_account("b@example.com")).await.unwrap();

        for expected in 1..=4 {
            let state = repo
                .record_failed_login(account.id, 5, Duration::minutes(15))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(state.login_attempts, expected);
            assert!(state.lock_until.is_none());
        }

        let state = repo
            .record_failed_login(account.id, 5, Duration::minutes(15))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.login_attempts, 5);
        assert!(state.lock_until.unwrap() > Utc::now() + Duration::minutes(14));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_never_lose_increments() {
        let repo = Arc::new(MemoryAccountRepository::new());
        let account = repo.create(new_account("c@example.com")).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.record_failed_login(account.id, 5, Duration::minutes(15))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.login_attempts, 50);
    }

    #[tokio::test]
    async fn test_unknown_account_records_nothing() {
        let repo = MemoryAccountRepository::new();
        let state = repo
            .record_failed_login(Uuid::new_v4(), 5, Duration::minutes(15))
            .await
            .unwrap();
        assert!(state.is_none());
    }
}
