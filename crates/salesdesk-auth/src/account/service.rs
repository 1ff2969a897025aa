//! Account flows that sit beside login: registration, verification,
//! password reset/change and administrative block/unblock/unlock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use uuid::Uuid;

use salesdesk_core::config::auth::AuthConfig;
use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_database::repositories::AccountRepository;
use salesdesk_entity::account::{Account, CreateAccount, normalize_email};
use salesdesk_entity::audit::{AuditAction, NewAuditEvent};
use salesdesk_entity::session::SessionMetadata;

use crate::audit::AuditSink;
use crate::lockout::{LockoutPolicy, user_not_found};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::session::SessionRegistry;

use super::notifier::AccountNotifier;

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    registry: Arc<SessionRegistry>,
    lockout: Arc<LockoutPolicy>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    notifier: Arc<dyn AccountNotifier>,
    audit: Arc<dyn AuditSink>,
    config: AuthConfig,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("validator", &self.validator)
            .finish()
    }
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        registry: Arc<SessionRegistry>,
        lockout: Arc<LockoutPolicy>,
        notifier: Arc<dyn AccountNotifier>,
        audit: Arc<dyn AuditSink>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts,
            registry,
            lockout,
            hasher: PasswordHasher::new(),
            validator: PasswordValidator::new(config),
            notifier,
            audit,
            config: config.clone(),
        }
    }

    /// Create an account. Unless verification is disabled, the account
    /// starts unverified and a 6-digit code is sent.
    pub async fn register(&self, input: RegisterAccount, client: &SessionMetadata) -> AppResult<Account> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let email = normalize_email(&input.email);

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        self.validator
            .validate(&input.password, &[name.as_str(), email.as_str()])?;
        let password_hash = self.hasher.hash_password(&input.password)?;

        let verify = self.config.require_email_verification;
        let code = verify.then(generate_code);
        let account = self
            .accounts
            .create(CreateAccount {
                name,
                email,
                phone: input.phone,
                password_hash,
                email_verified: !verify,
                verification_code: code.clone(),
                verification_code_expires_at: code
                    .as_ref()
                    .map(|_| self.code_expiry(self.config.verification_code_ttl_minutes)),
                global_roles: Vec::new(),
            })
            .await?;

        if let Some(code) = &code {
            self.deliver_verification(&account, code).await;
        }

        info!(account_id = %account.id, "Account registered");
        self.audit.append(
            NewAuditEvent::new(AuditAction::Register)
                .actor(account.id)
                .target(account.id)
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        Ok(account)
    }

    /// Confirm an email address. Unknown and already verified addresses
    /// fail exactly like a wrong code.
    pub async fn verify_email(&self, email: &str, code: &str, client: &SessionMetadata) -> AppResult<()> {
        let invalid = || {
            AppError::coded(
                ErrorKind::Validation,
                ErrorCode::InvalidVerificationCode,
                "Invalid or expired verification code",
            )
        };
        let account = self
            .accounts
            .find_by_email(&normalize_email(email))
            .await?
            .filter(|a| !a.email_verified)
            .ok_or_else(invalid)?;
        if !code_matches(
            account.verification_code.as_deref(),
            account.verification_code_expires_at,
            code,
        ) {
            return Err(invalid());
        }

        self.accounts.mark_email_verified(account.id).await?;
        self.audit.append(
            NewAuditEvent::new(AuditAction::EmailVerified)
                .actor(account.id)
                .target(account.id)
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        Ok(())
    }

    /// Issue a fresh verification code, replacing any previous one.
    /// Unknown and already verified addresses succeed without sending.
    pub async fn resend_verification(&self, email: &str) -> AppResult<()> {
        let account = self.accounts.find_by_email(&normalize_email(email)).await?;
        let Some(account) = account.filter(|a| !a.email_verified) else {
            debug!("Verification resend skipped: unknown or verified email");
            return Ok(());
        };
        let code = generate_code();
        self.accounts
            .set_verification_code(
                account.id,
                &code,
                self.code_expiry(self.config.verification_code_ttl_minutes),
            )
            .await?;
        self.deliver_verification(&account, &code).await;
        Ok(())
    }

    /// Start a password reset. Unknown addresses succeed silently so the
    /// endpoint does not reveal which emails are registered.
    pub async fn forgot_password(&self, email: &str, client: &SessionMetadata) -> AppResult<()> {
        let Some(account) = self.accounts.find_by_email(&normalize_email(email)).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let code = generate_code();
        self.accounts
            .set_reset_code(
                account.id,
                Some((code.as_str(), self.code_expiry(self.config.reset_code_ttl_minutes))),
            )
            .await?;
        if let Err(e) = self.notifier.send_reset_code(&account, &code).await {
            warn!(account_id = %account.id, error = %e, "Failed to deliver reset code");
        }

        self.audit.append(
            NewAuditEvent::new(AuditAction::PasswordResetRequested)
                .target(account.id)
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        Ok(())
    }

    pub async fn verify_reset_code(&self, email: &str, code: &str) -> AppResult<()> {
        self.checked_reset_account(email, code).await.map(|_| ())
    }

    /// Set a new password with a valid reset code. Every session of the
    /// account is revoked.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        client: &SessionMetadata,
    ) -> AppResult<()> {
        let account = self.checked_reset_account(email, code).await?;
        self.validator
            .validate(new_password, &[account.name.as_str(), account.email.as_str()])?;

        let hash = self.hasher.hash_password(new_password)?;
        self.accounts.update_password(account.id, &hash).await?;
        let revoked = self.registry.remove_all(account.id).await?;

        info!(account_id = %account.id, revoked_sessions = revoked, "Password reset");
        self.audit.append(
            NewAuditEvent::new(AuditAction::PasswordReset)
                .actor(account.id)
                .target(account.id)
                .metadata(json!({ "revokedSessions": revoked }))
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        Ok(())
    }

    /// Change the caller's password. The current password is required.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
        client: &SessionMetadata,
    ) -> AppResult<()> {
        let account = self.get(account_id).await?;
        if !self
            .hasher
            .verify_password(old_password, &account.password_hash)?
        {
            return Err(AppError::coded(
                ErrorKind::Validation,
                ErrorCode::OldPasswordIncorrect,
                "Current password is incorrect",
            ));
        }
        self.validator.validate_not_same(old_password, new_password)?;
        self.validator
            .validate(new_password, &[account.name.as_str(), account.email.as_str()])?;

        let hash = self.hasher.hash_password(new_password)?;
        self.accounts.update_password(account.id, &hash).await?;

        self.audit.append(
            NewAuditEvent::new(AuditAction::PasswordChanged)
                .actor(account.id)
                .target(account.id)
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
        Ok(())
    }

    pub async fn get(&self, account_id: Uuid) -> AppResult<Account> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| user_not_found(account_id))
    }

    pub async fn list_accounts(&self, page: &PageRequest) -> AppResult<PageResponse<Account>> {
        self.accounts.list(page).await
    }

    /// Block an account and revoke all of its sessions.
    pub async fn block(&self, actor: Uuid, target: Uuid, client: &SessionMetadata) -> AppResult<()> {
        if actor == target {
            return Err(AppError::validation("You cannot block your own account"));
        }
        if !self.accounts.set_blocked(target, true).await? {
            return Err(user_not_found(target));
        }
        let revoked = self.registry.remove_all(target).await?;

        warn!(actor = %actor, target = %target, "Account blocked");
        self.admin_event(AuditAction::AccountBlocked, actor, target, client, json!({ "revokedSessions": revoked }));
        Ok(())
    }

    pub async fn unblock(&self, actor: Uuid, target: Uuid, client: &SessionMetadata) -> AppResult<()> {
        if !self.accounts.set_blocked(target, false).await? {
            return Err(user_not_found(target));
        }
        info!(actor = %actor, target = %target, "Account unblocked");
        self.admin_event(AuditAction::AccountUnblocked, actor, target, client, json!({}));
        Ok(())
    }

    pub async fn unlock(&self, actor: Uuid, target: Uuid, client: &SessionMetadata) -> AppResult<()> {
        self.lockout.unlock(target).await?;
        info!(actor = %actor, target = %target, "Account unlocked");
        self.admin_event(AuditAction::AccountUnlocked, actor, target, client, json!({}));
        Ok(())
    }

    async fn checked_reset_account(&self, email: &str, code: &str) -> AppResult<Account> {
        let invalid = || {
            AppError::coded(
                ErrorKind::Validation,
                ErrorCode::InvalidResetCode,
                "Invalid or expired reset code",
            )
        };
        let account = self
            .accounts
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;
        if code_matches(account.reset_code.as_deref(), account.reset_code_expires_at, code) {
            return Ok(account);
        }

        if account.reset_code.is_some() {
            let max = self.config.reset_code_max_attempts;
            let attempts = self
                .accounts
                .record_reset_code_failure(account.id, max)
                .await?;
            if attempts.is_some_and(|n| n >= max) {
                warn!(account_id = %account.id, "Reset code discarded after repeated wrong guesses");
            }
        }
        Err(invalid())
    }

    async fn deliver_verification(&self, account: &Account, code: &str) {
        if let Err(e) = self.notifier.send_verification_code(account, code).await {
            warn!(account_id = %account.id, error = %e, "Failed to deliver verification code");
        }
    }

    fn code_expiry(&self, minutes: u64) -> DateTime<Utc> {
        Utc::now() + Duration::minutes(minutes as i64)
    }

    fn admin_event(
        &self,
        action: AuditAction,
        actor: Uuid,
        target: Uuid,
        client: &SessionMetadata,
        metadata: serde_json::Value,
    ) {
        self.audit.append(
            NewAuditEvent::new(action)
                .actor(actor)
                .target(target)
                .metadata(metadata)
                .client(client.ip_address.clone(), client.user_agent.clone()),
        );
    }
}

/// Six decimal digits from the OS random source.
fn generate_code() -> String {
    format!("{:06}", OsRng.gen_range(0..1_000_000u32))
}

fn code_matches(stored: Option<&str>, expires_at: Option<DateTime<Utc>>, presented: &str) -> bool {
    let equal = stored.is_some_and(|s| bool::from(s.as_bytes().ct_eq(presented.trim().as_bytes())));
    equal && expires_at.is_some_and(|at| at > Utc::now())
}

fn email_taken() -> AppError {
    AppError::coded(
        ErrorKind::Conflict,
        ErrorCode::EmailAlreadyRegistered,
        "Email is already registered",
    )
}


#[cfg(test)]
mod tests {
    use salesdesk_cache::provider::CacheManager;
    use salesdesk_core::config::session::SessionConfig;
    use salesdesk_database::repositories::memory::{MemoryAccountRepository, MemorySessionRepository};

    use super::*;
    use crate::audit::sink::testing::RecordingSink;
    use crate::revocation::RevocationList;
    use crate::token::RefreshToken;

    const PASSWORD: &str = "copper-meadow-signal-31";

    struct Fixture {
        service: AccountService,
        accounts: Arc<dyn AccountRepository>,
        registry: Arc<SessionRegistry>,
        audit: Arc<RecordingSink>,
    }

    fn fixture() -> Fixture {
        let config = AuthConfig::default();
        let accounts: Arc<dyn AccountRepository> = Arc::new(MemoryAccountRepository::new());
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(MemorySessionRepository::new()),
            RevocationList::new(Arc::new(CacheManager::in_memory())),
            &SessionConfig::default(),
        ));
        let audit = Arc::new(RecordingSink::default());
        let service = AccountService::new(
            accounts.clone(),
            registry.clone(),
            Arc::new(LockoutPolicy::new(accounts.clone(), &config)),
            Arc::new(crate::account::LogNotifier),
            audit.clone(),
            &config,
        );
        Fixture {
            service,
            accounts,
            registry,
            audit,
        }
    }

    fn registration(email: &str) -> RegisterAccount {
        RegisterAccount {
            name: "Field Rep".into(),
            email: email.into(),
            password: PASSWORD.into(),
            phone: None,
        }
    }

    fn client() -> SessionMetadata {
        SessionMetadata::default()
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn register_then_verify() {
        let f = fixture();
        let account = f.service.register(registration("New@Example.com"), &client()).await.unwrap();
        assert_eq!(account.email, "new@example.com");
        assert!(!account.email_verified);

        let err = f
            .service
            .verify_email("new@example.com", "not-it", &client())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidVerificationCode);

        let code = account.verification_code.clone().unwrap();
        f.service.verify_email("new@example.com", &code, &client()).await.unwrap();
        let stored = f.accounts.find_by_id(account.id).await.unwrap().unwrap();
        assert!(stored.email_verified);

        let err = f
            .service
            .verify_email("new@example.com", &code, &client())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidVerificationCode);
        f.service.resend_verification("new@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_email_is_indistinguishable_in_verification() {
        let f = fixture();
        let err = f
            .service
            .verify_email("ghost@example.com", "123456", &client())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidVerificationCode);
        f.service.resend_verification("ghost@example.com").await.unwrap();
    }

    #[test]
    fn code_comparison_checks_value_and_expiry() {
        let later = Some(Utc::now() + Duration::minutes(5));
        let earlier = Some(Utc::now() - Duration::minutes(5));
        assert!(code_matches(Some("042137"), later, " 042137 "));
        assert!(!code_matches(Some("042137"), later, "042138"));
        assert!(!code_matches(Some("042137"), later, "04213"));
        assert!(!code_matches(Some("042137"), earlier, "042137"));
        assert!(!code_matches(None, later, "042137"));
    }

    #[tokio::test]
    async fn reset_code_is_discarded_after_repeated_wrong_guesses() {
        let f = fixture();
        let account = f.service.register(registration("guess@example.com"), &client()).await.unwrap();
        f.service.forgot_password("guess@example.com", &client()).await.unwrap();
        let code = f
            .accounts
            .find_by_id(account.id)
            .await
            .unwrap()
            .unwrap()
            .reset_code
            .unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        for _ in 0..AuthConfig::default().reset_code_max_attempts {
            let err = f
                .service
                .verify_reset_code("guess@example.com", wrong)
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidResetCode);
        }

        let err = f
            .service
            .verify_reset_code("guess@example.com", &code)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResetCode);

        f.service.forgot_password("guess@example.com", &client()).await.unwrap();
        let fresh = f
            .accounts
            .find_by_id(account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.reset_code_attempts, 0);
        let fresh_code = fresh.reset_code.unwrap();
        f.service.verify_reset_code("guess@example.com", &fresh_code).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let f = fixture();
        f.service.register(registration("dup@example.com"), &client()).await.unwrap();
        let err = f
            .service
            .register(registration(" DUP@example.com"), &client())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let f = fixture();
        let mut input = registration("weak@example.com");
        input.password = "password".into();
        let err = f.service.register(input, &client()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WeakPassword);
    }

    #[tokio::test]
    async fn reset_password_revokes_all_sessions() {
        let f = fixture();
        let account = f.service.register(registration("reset@example.com"), &client()).await.unwrap();
        for _ in 0..2 {
            f.registry
                .add(
                    account.id,
                    &RefreshToken::generate(),
                    client(),
                    Utc::now() + Duration::days(7),
                )
                .await
                .unwrap();
        }

        f.service.forgot_password("reset@example.com", &client()).await.unwrap();
        let code = f
            .accounts
            .find_by_id(account.id)
            .await
            .unwrap()
            .unwrap()
            .reset_code
            .unwrap();

        f.service.verify_reset_code("reset@example.com", &code).await.unwrap();
        f.service
            .reset_password("reset@example.com", &code, "saffron-orbit-tundra-58", &client())
            .await
            .unwrap();

        assert!(f.registry.list(account.id).await.unwrap().is_empty());
        let err = f
            .service
            .verify_reset_code("reset@example.com", &code)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResetCode);
        assert!(f.audit.actions().contains(&"password_reset".to_string()));
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_silent() {
        let f = fixture();
        f.service.forgot_password("ghost@example.com", &client()).await.unwrap();
        assert!(f.audit.actions().is_empty());
    }

    #[tokio::test]
    async fn change_password_requires_the_old_one() {
        let f = fixture();
        let account = f.service.register(registration("change@example.com"), &client()).await.unwrap();

        let err = f
            .service
            .change_password(account.id, "wrong-password", "amber-thicket-route-64", &client())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OldPasswordIncorrect);

        f.service
            .change_password(account.id, PASSWORD, "amber-thicket-route-64", &client())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn block_revokes_sessions_and_unblock_restores() {
        let f = fixture();
        let account = f.service.register(registration("blocked@example.com"), &client()).await.unwrap();
        f.registry
            .add(account.id, &RefreshToken::generate(), client(), Utc::now() + Duration::days(7))
            .await
            .unwrap();
        let admin = Uuid::new_v4();

        f.service.block(admin, account.id, &client()).await.unwrap();
        assert!(f.service.get(account.id).await.unwrap().is_blocked);
        assert!(f.registry.list(account.id).await.unwrap().is_empty());

        f.service.unblock(admin, account.id, &client()).await.unwrap();
        assert!(!f.service.get(account.id).await.unwrap().is_blocked);

        let err = f.service.block(admin, Uuid::new_v4(), &client()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }
}
