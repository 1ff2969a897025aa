//! Wiring of the identity core over one set of repositories and one cache.

use std::sync::Arc;

use salesdesk_cache::provider::CacheManager;
use salesdesk_core::config::AppConfig;
use salesdesk_database::repositories::Repositories;

use crate::account::{AccountNotifier, AccountService};
use crate::audit::{AuditSink, AuditTrail};
use crate::lockout::LockoutPolicy;
use crate::rbac::{MembershipManager, RoleAuthority};
use crate::revocation::RevocationList;
use crate::session::{SessionCleanup, SessionManager, SessionRegistry};
use crate::token::TokenService;

/// Every auth component, built once at startup and shared.
#[derive(Debug, Clone)]
pub struct AuthServices {
    pub tokens: Arc<TokenService>,
    pub revocations: RevocationList,
    pub registry: Arc<SessionRegistry>,
    pub lockout: Arc<LockoutPolicy>,
    pub sessions: Arc<SessionManager>,
    pub accounts: Arc<AccountService>,
    pub authority: Arc<RoleAuthority>,
    pub membership: Arc<MembershipManager>,
    pub audit: AuditTrail,
}

impl AuthServices {
    /// Build the services. Must run inside a Tokio runtime: the audit
    /// writer task is spawned here.
    pub fn new(
        config: &AppConfig,
        repos: &Repositories,
        cache: Arc<CacheManager>,
        notifier: Arc<dyn AccountNotifier>,
    ) -> Self {
        let audit = AuditTrail::new(repos.audit.clone());
        let sink: Arc<dyn AuditSink> = Arc::new(audit.clone());

        let tokens = Arc::new(TokenService::new(&config.auth));
        let revocations = RevocationList::new(cache);
        let registry = Arc::new(SessionRegistry::new(
            repos.sessions.clone(),
            revocations.clone(),
            &config.session,
        ));
        let lockout = Arc::new(LockoutPolicy::new(repos.accounts.clone(), &config.auth));

        let sessions = Arc::new(SessionManager::new(
            repos.accounts.clone(),
            tokens.clone(),
            registry.clone(),
            revocations.clone(),
            lockout.clone(),
            sink.clone(),
            &config.auth,
        ));
        let accounts = Arc::new(AccountService::new(
            repos.accounts.clone(),
            registry.clone(),
            lockout.clone(),
            notifier,
            sink.clone(),
            &config.auth,
        ));
        let authority = Arc::new(RoleAuthority::new(
            repos.bindings.clone(),
            repos.accounts.clone(),
            sink.clone(),
        ));
        let membership = Arc::new(MembershipManager::new(
            repos.bindings.clone(),
            repos.accounts.clone(),
            sink,
        ));

        Self {
            tokens,
            revocations,
            registry,
            lockout,
            sessions,
            accounts,
            authority,
            membership,
            audit,
        }
    }

    /// The expired-session sweeper for these services.
    pub fn session_cleanup(&self, interval_minutes: u64) -> SessionCleanup {
        SessionCleanup::new(self.registry.clone(), interval_minutes)
    }
}
