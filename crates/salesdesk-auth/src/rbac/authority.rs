//! Gate evaluation for company-scoped and platform-wide authorization.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use salesdesk_core::error::AppError;
use salesdesk_core::result::AppResult;
use salesdesk_database::repositories::{AccountRepository, BindingRepository};
use salesdesk_entity::audit::{AuditAction, NewAuditEvent};
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, Permission};

use crate::audit::AuditSink;
use crate::principal::Principal;

use super::requirement::Requirement;

/// Resolves bindings and evaluates the independent authorization gates.
/// Every gate fails closed when the account has no binding in the company.
#[derive(Clone)]
pub struct RoleAuthority {
    bindings: Arc<dyn BindingRepository>,
    accounts: Arc<dyn AccountRepository>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for RoleAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAuthority").finish()
    }
}

impl RoleAuthority {
    pub fn new(
        bindings: Arc<dyn BindingRepository>,
        accounts: Arc<dyn AccountRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            bindings,
            accounts,
            audit,
        }
    }

    pub async fn binding(
        &self,
        account_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        self.bindings.find(account_id, company_id).await
    }

    pub async fn has_any_role(
        &self,
        account_id: Uuid,
        company_id: Uuid,
        allowed: &[CompanyRole],
    ) -> AppResult<bool> {
        self.evaluate(account_id, company_id, &Requirement::any_role(allowed))
            .await
    }

    pub async fn has_permission(
        &self,
        account_id: Uuid,
        company_id: Uuid,
        permission: Permission,
    ) -> AppResult<bool> {
        self.evaluate(account_id, company_id, &Requirement::Permission(permission))
            .await
    }

    pub async fn has_level(
        &self,
        account_id: Uuid,
        company_id: Uuid,
        role: CompanyRole,
        min_level: i32,
    ) -> AppResult<bool> {
        self.evaluate(account_id, company_id, &Requirement::Level { role, min_level })
            .await
    }

    pub async fn can_perform_action(
        &self,
        account_id: Uuid,
        company_id: Uuid,
        action: Permission,
    ) -> AppResult<bool> {
        self.evaluate(account_id, company_id, &Requirement::Action(action))
            .await
    }

    /// Platform role check against the stored account.
    pub async fn has_global_role(&self, account_id: Uuid, role: &str) -> AppResult<bool> {
        Ok(self
            .accounts
            .find_by_id(account_id)
            .await?
            .is_some_and(|account| account.has_global_role(role)))
    }

    pub async fn evaluate(
        &self,
        account_id: Uuid,
        company_id: Uuid,
        requirement: &Requirement,
    ) -> AppResult<bool> {
        let binding = self.binding(account_id, company_id).await?;
        Ok(requirement.is_met_by(binding.as_ref()))
    }

    /// Entry point for other modules. A storage failure denies.
    pub async fn authorize(
        &self,
        principal: &Principal,
        company_id: Uuid,
        requirement: &Requirement,
    ) -> bool {
        match self
            .evaluate(principal.account_id, company_id, requirement)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                error!(
                    account_id = %principal.account_id,
                    company_id = %company_id,
                    error = %e,
                    "Authorization lookup failed, denying"
                );
                false
            }
        }
    }

    /// Like `authorize`, but a denial is an error and is audited.
    pub async fn require(
        &self,
        principal: &Principal,
        company_id: Uuid,
        requirement: &Requirement,
    ) -> AppResult<CompanyRoleBinding> {
        let binding = self.binding(principal.account_id, company_id).await?;
        match binding {
            Some(binding) if requirement.is_met_by(Some(&binding)) => Ok(binding),
            other => {
                let err = requirement.denial(other.is_some());
                self.audit_denial(principal.account_id, Some(company_id), &requirement.to_string(), &err);
                Err(err)
            }
        }
    }

    /// Require a platform role such as `it_support`.
    pub async fn require_global_role(&self, principal: &Principal, role: &str) -> AppResult<()> {
        if self.has_global_role(principal.account_id, role).await? {
            return Ok(());
        }
        let err = AppError::forbidden(format!("Requires the {role} role"));
        self.audit_denial(principal.account_id, None, &format!("global role {role}"), &err);
        Err(err)
    }

    fn audit_denial(&self, account_id: Uuid, company_id: Option<Uuid>, requirement: &str, err: &AppError) {
        warn!(
            account_id = %account_id,
            company_id = ?company_id,
            requirement = %requirement,
            code = %err.code.as_str(),
            "Access denied"
        );
        let mut event = NewAuditEvent::new(AuditAction::AccessDenied)
            .actor(account_id)
            .metadata(json!({ "requirement": requirement, "code": err.code.as_str() }));
        if let Some(company_id) = company_id {
            event = event.company(company_id);
        }
        self.audit.append(event);
    }
}

#[cfg(test)]
mod tests {
    use salesdesk_core::error::ErrorCode;
    use salesdesk_database::repositories::memory::{MemoryAccountRepository, MemoryBindingRepository};
    use salesdesk_entity::account::CreateAccount;

    use super::*;
    use crate::audit::sink::testing::RecordingSink;

    struct Fixture {
        authority: RoleAuthority,
        bindings: Arc<dyn BindingRepository>,
        audit: Arc<RecordingSink>,
        support: Principal,
        rep: Principal,
    }

    async fn fixture() -> Fixture {
        let accounts: Arc<dyn AccountRepository> = Arc::new(MemoryAccountRepository::new());
        let bindings: Arc<dyn BindingRepository> = Arc::new(MemoryBindingRepository::new());
        let audit = Arc::new(RecordingSink::default());
        let mut principals = Vec::new();
        for (email, roles) in [("it@example.com", vec!["it_support".to_string()]), ("rep@example.com", vec![])] {
            let account = accounts
                .create(CreateAccount {
                    name: email.into(),
                    email: email.into(),
                    phone: None,
                    password_hash: "hash".into(),
                    email_verified: true,
                    verification_code: None,
                    verification_code_expires_at: None,
                    global_roles: roles,
                })
                .await
                .unwrap();
            principals.push(Principal::from(&account));
        }
        let rep = principals.pop().unwrap();
        let support = principals.pop().unwrap();
        Fixture {
            authority: RoleAuthority::new(bindings.clone(), accounts, audit.clone()),
            bindings,
            audit,
            support,
            rep,
        }
    }

    #[tokio::test]
    async fn gates_are_isolated_per_company() {
        let f = fixture().await;
        let (mine, other) = (Uuid::new_v4(), Uuid::new_v4());
        let mut binding = CompanyRoleBinding::new(f.rep.account_id, mine, CompanyRole::Admin);
        binding.level = 4;
        binding.permissions.insert(Permission::CreateLead);
        f.bindings.insert(binding).await.unwrap();

        let id = f.rep.account_id;
        assert!(f.authority.has_any_role(id, mine, &[CompanyRole::Admin]).await.unwrap());
        assert!(f.authority.has_permission(id, mine, Permission::CreateLead).await.unwrap());
        assert!(f.authority.has_level(id, mine, CompanyRole::Admin, 4).await.unwrap());
        assert!(f.authority.can_perform_action(id, mine, Permission::AssignLead).await.unwrap());

        assert!(!f.authority.has_any_role(id, other, &CompanyRole::ALL).await.unwrap());
        assert!(!f.authority.has_permission(id, other, Permission::CreateLead).await.unwrap());
        assert!(!f.authority.has_level(id, other, CompanyRole::Admin, 0).await.unwrap());
        assert!(!f.authority.can_perform_action(id, other, Permission::CreateLead).await.unwrap());
    }

    #[tokio::test]
    async fn require_reports_the_gate_and_audits() {
        let f = fixture().await;
        let company = Uuid::new_v4();
        f.bindings
            .insert(CompanyRoleBinding::new(f.rep.account_id, company, CompanyRole::Supervisor))
            .await
            .unwrap();

        let err = f
            .authority
            .require(
                &f.rep,
                company,
                &Requirement::Level {
                    role: CompanyRole::Supervisor,
                    min_level: 2,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientRoleLevel);
        assert_eq!(err.status_code(), 403);

        let events = f.audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "access_denied");
        assert_eq!(events[0].company_id, Some(company));

        let binding = f
            .authority
            .require(&f.rep, company, &Requirement::any_role(&[CompanyRole::Supervisor]))
            .await
            .unwrap();
        assert_eq!(binding.role, CompanyRole::Supervisor);
        assert!(
            f.authority
                .authorize(&f.rep, company, &Requirement::any_role(&[CompanyRole::Supervisor]))
                .await
        );
    }

    #[tokio::test]
    async fn global_role_gate() {
        let f = fixture().await;
        assert!(f.authority.require_global_role(&f.support, "it_support").await.is_ok());
        let err = f
            .authority
            .require_global_role(&f.rep, "it_support")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(f.audit.actions(), vec!["access_denied".to_string()]);
    }
}
