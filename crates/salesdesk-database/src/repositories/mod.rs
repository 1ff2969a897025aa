//! Repository traits and their PostgreSQL / in-memory implementations.
//!
//! Every mutation that must be atomic per account (lockout counters,
//! session list changes, token swaps) is a single trait method so each
//! backend can implement it with its own primitive: one SQL statement or
//! transaction in PostgreSQL, one map entry lock in memory.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_entity::account::{Account, CreateAccount, LockoutState};
use salesdesk_entity::audit::{AuditEvent, AuditFilter};
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, PermissionSet};
use salesdesk_entity::session::Session;

/// Credential store.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    /// Insert a new account. Fails with `EMAIL_ALREADY_REGISTERED` on a duplicate email.
    async fn create(&self, data: CreateAccount) -> AppResult<Account>;

    /// All accounts, newest first.
    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Account>>;

    /// Atomically increment `login_attempts` and, when the new count reaches
    /// `max_attempts`, set `lock_until = now + lock_for`. Returns `None` if the
    /// account does not exist.
    async fn record_failed_login(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_for: Duration,
    ) -> AppResult<Option<LockoutState>>;

    /// Zero the failure counter and clear any lock.
    async fn reset_lockout(&self, id: Uuid) -> AppResult<bool>;

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> AppResult<bool>;

    async fn set_verification_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Mark the email verified and clear the verification code.
    async fn mark_email_verified(&self, id: Uuid) -> AppResult<()>;

    /// Store or clear (`None`) the password reset code. Either way the
    /// wrong-guess counter starts over.
    async fn set_reset_code(
        &self,
        id: Uuid,
        code: Option<(&str, DateTime<Utc>)>,
    ) -> AppResult<()>;

    /// Count a wrong guess against the current reset code in one atomic
    /// step. Once the count reaches `max_attempts` the code is discarded.
    /// Returns the new count, or `None` if the account does not exist.
    async fn record_reset_code_failure(&self, id: Uuid, max_attempts: i32) -> AppResult<Option<i32>>;

    /// Replace the password hash and clear any reset code.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
}

/// Refresh sessions, keyed by account and by token digest.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Add a session and, if the account now holds more than `cap` sessions
    /// (`0` = unbounded), drop the oldest ones in the same atomic step.
    /// Returns the evicted sessions.
    async fn insert_capped(&self, session: Session, cap: usize) -> AppResult<Vec<Session>>;

    async fn find_by_digest(&self, token_digest: &str) -> AppResult<Option<Session>>;

    /// Compare-and-swap the token of the session holding `old_digest` for
    /// `account_id`. Returns the updated session, or `None` if `old_digest`
    /// is no longer active.
    async fn replace_token(
        &self,
        account_id: Uuid,
        old_digest: &str,
        new_digest: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Remove the session holding `token_digest`, if any.
    async fn remove_by_digest(
        &self,
        account_id: Uuid,
        token_digest: &str,
    ) -> AppResult<Option<Session>>;

    async fn remove_by_id(&self, account_id: Uuid, session_id: Uuid) -> AppResult<Option<Session>>;

    /// Sessions of one account, oldest first.
    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<Session>>;

    async fn remove_all(&self, account_id: Uuid) -> AppResult<Vec<Session>>;

    /// Delete sessions whose natural expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Company role bindings.
#[async_trait]
pub trait BindingRepository: Send + Sync + 'static {
    async fn find(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Option<CompanyRoleBinding>>;

    /// Insert a binding. Fails with `ALREADY_MEMBER` if the pair exists.
    async fn insert(&self, binding: CompanyRoleBinding) -> AppResult<CompanyRoleBinding>;

    async fn update_role(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        role: CompanyRole,
    ) -> AppResult<Option<CompanyRoleBinding>>;

    async fn update_level(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        level: i32,
    ) -> AppResult<Option<CompanyRoleBinding>>;

    async fn update_permissions(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        permissions: &PermissionSet,
    ) -> AppResult<Option<CompanyRoleBinding>>;

    async fn delete(&self, user_id: Uuid, company_id: Uuid) -> AppResult<bool>;

    /// Remove every binding of a company. Returns the number removed.
    async fn delete_company(&self, company_id: Uuid) -> AppResult<u64>;

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>>;

    async fn list_for_company(&self, company_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>>;
}

/// Append-only audit storage.
#[async_trait]
pub trait AuditRepository: Send + Sync + 'static {
    async fn insert(&self, event: &AuditEvent) -> AppResult<()>;

    /// Matching events, newest first, with the total match count.
    async fn search(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>>;
}

/// The full set of repositories used by the identity core.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub bindings: Arc<dyn BindingRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(postgres::PgAccountRepository::new(pool.clone())),
            sessions: Arc::new(postgres::PgSessionRepository::new(pool.clone())),
            bindings: Arc::new(postgres::PgBindingRepository::new(pool.clone())),
            audit: Arc::new(postgres::PgAuditRepository::new(pool)),
        }
    }

    /// Process-local repositories.
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(memory::MemoryAccountRepository::new()),
            sessions: Arc::new(memory::MemorySessionRepository::new()),
            bindings: Arc::new(memory::MemoryBindingRepository::new()),
            audit: Arc::new(memory::MemoryAuditRepository::new()),
        }
    }
}
