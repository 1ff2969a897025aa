//! Company membership lifecycle. Every mutation is audited.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_database::repositories::{AccountRepository, BindingRepository};
use salesdesk_entity::audit::{AuditAction, NewAuditEvent};
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, PermissionSet};

use crate::audit::AuditSink;
use crate::lockout::user_not_found;

#[derive(Clone)]
pub struct MembershipManager {
    bindings: Arc<dyn BindingRepository>,
    accounts: Arc<dyn AccountRepository>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for MembershipManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipManager").finish()
    }
}

impl MembershipManager {
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

    /// Bind `user_id` to a company, on invite acceptance or an approved
    /// join request. Conflicts with `ALREADY_MEMBER` if already bound.
    pub async fn join(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: CompanyRole,
        actor: Option<Uuid>,
    ) -> AppResult<CompanyRoleBinding> {
        if self.accounts.find_by_id(user_id).await?.is_none() {
            return Err(user_not_found(user_id));
        }

        let binding = self
            .bindings
            .insert(CompanyRoleBinding::new(user_id, company_id, role))
            .await?;

        info!(company_id = %company_id, user_id = %user_id, role = %role, "Member joined company");
        self.record(
            AuditAction::UserInvited,
            actor,
            company_id,
            Some(user_id),
            json!({ "role": role.as_str() }),
        );
        Ok(binding)
    }

    pub async fn assign_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: CompanyRole,
        actor: Option<Uuid>,
    ) -> AppResult<CompanyRoleBinding> {
        let binding = self
            .bindings
            .update_role(user_id, company_id, role)
            .await?
            .ok_or_else(not_a_member)?;
        self.record(
            AuditAction::RoleAssigned,
            actor,
            company_id,
            Some(user_id),
            json!({ "role": role.as_str() }),
        );
        Ok(binding)
    }

    pub async fn set_level(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        level: i32,
        actor: Option<Uuid>,
    ) -> AppResult<CompanyRoleBinding> {
        if level < 1 {
            return Err(AppError::validation("Level must be at least 1"));
        }
        let binding = self
            .bindings
            .update_level(user_id, company_id, level)
            .await?
            .ok_or_else(not_a_member)?;
        self.record(
            AuditAction::LevelAssigned,
            actor,
            company_id,
            Some(user_id),
            json!({ "level": level }),
        );
        Ok(binding)
    }

    pub async fn set_permissions(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        permissions: PermissionSet,
        actor: Option<Uuid>,
    ) -> AppResult<CompanyRoleBinding> {
        let binding = self
            .bindings
            .update_permissions(user_id, company_id, &permissions)
            .await?
            .ok_or_else(not_a_member)?;
        self.record(
            AuditAction::PermissionsUpdated,
            actor,
            company_id,
            Some(user_id),
            json!({ "permissions": permissions.to_strings() }),
        );
        Ok(binding)
    }

    pub async fn remove(&self, company_id: Uuid, user_id: Uuid, actor: Option<Uuid>) -> AppResult<()> {
        if !self.bindings.delete(user_id, company_id).await? {
            return Err(not_a_member());
        }
        info!(company_id = %company_id, user_id = %user_id, "Member removed from company");
        self.record(
            AuditAction::UserRemoved,
            actor,
            company_id,
            Some(user_id),
            json!({}),
        );
        Ok(())
    }

    /// Remove every binding of a deleted company.
    pub async fn drop_company(&self, company_id: Uuid, actor: Option<Uuid>) -> AppResult<u64> {
        let removed = self.bindings.delete_company(company_id).await?;
        info!(company_id = %company_id, removed = removed, "Company bindings dropped");
        self.record(
            AuditAction::CompanyDeleted,
            actor,
            company_id,
            None,
            json!({ "removedBindings": removed }),
        );
        Ok(removed)
    }

    /// Companies an account belongs to.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>> {
        self.bindings.list_for_user(user_id).await
    }

    pub async fn list_for_company(&self, company_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>> {
        self.bindings.list_for_company(company_id).await
    }

    fn record(
        &self,
        action: AuditAction,
        actor: Option<Uuid>,
        company_id: Uuid,
        target: Option<Uuid>,
        metadata: serde_json::Value,
    ) {
        let mut event = NewAuditEvent::new(action)
            .company(company_id)
            .metadata(metadata);
        if let Some(actor) = actor {
            event = event.actor(actor);
        }
        if let Some(target) = target {
            event = event.target(target);
        }
        self.audit.append(event);
    }
}

fn not_a_member() -> AppError {
    AppError::coded(
        ErrorKind::NotFound,
        ErrorCode::UserNotInCompany,
        "User is not a member of this company",
    )
}

#[cfg(test)]
mod tests {
    use salesdesk_database::repositories::memory::{MemoryAccountRepository, MemoryBindingRepository};
    use salesdesk_entity::account::CreateAccount;
    use salesdesk_entity::company::Permission;

    use super::*;
    use crate::audit::sink::testing::RecordingSink;

    async fn setup() -> (MembershipManager, Arc<RecordingSink>, Uuid) {
        let accounts: Arc<dyn AccountRepository> = Arc::new(MemoryAccountRepository::new());
        let account = accounts
            .create(CreateAccount {
                name: "Rep".into(),
                email: "rep@example.com".into(),
                phone: None,
                password_hash: "hash".into(),
                email_verified: true,
                verification_code: None,
                verification_code_expires_at: None,
                global_roles: vec![],
            })
            .await
            .unwrap();
        let audit = Arc::new(RecordingSink::default());
        let manager = MembershipManager::new(
            Arc::new(MemoryBindingRepository::new()),
            accounts,
            audit.clone(),
        );
        (manager, audit, account.id)
    }

    #[tokio::test]
    async fn join_twice_conflicts() {
        let (manager, _, user) = setup().await;
        let company = Uuid::new_v4();
        let binding = manager.join(company, user, CompanyRole::Salesman, None).await.unwrap();
        assert_eq!(binding.level, 1);

        let err = manager
            .join(company, user, CompanyRole::Admin, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyMember);
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn join_unknown_user_is_not_found() {
        let (manager, _, _) = setup().await;
        let err = manager
            .join(Uuid::new_v4(), Uuid::new_v4(), CompanyRole::Salesman, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn updates_on_non_members_are_not_found() {
        let (manager, _, user) = setup().await;
        let company = Uuid::new_v4();
        let err = manager
            .assign_role(company, user, CompanyRole::Admin, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotInCompany);
        let err = manager.remove(company, user, None).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn every_mutation_is_audited() {
        let (manager, audit, user) = setup().await;
        let company = Uuid::new_v4();
        let actor = Some(Uuid::new_v4());

        manager.join(company, user, CompanyRole::Salesman, actor).await.unwrap();
        manager.assign_role(company, user, CompanyRole::Supervisor, actor).await.unwrap();
        manager.set_level(company, user, 2, actor).await.unwrap();
        manager
            .set_permissions(company, user, [Permission::AssignLead].into_iter().collect(), actor)
            .await
            .unwrap();
        manager.remove(company, user, actor).await.unwrap();
        manager.drop_company(company, actor).await.unwrap();

        assert_eq!(
            audit.actions(),
            vec![
                "user_invited",
                "role_assigned",
                "level_assigned",
                "permissions_updated",
                "user_removed",
                "company_deleted",
            ]
        );
        assert!(manager.list_for_user(user).await.unwrap().is_empty());
    }
}
