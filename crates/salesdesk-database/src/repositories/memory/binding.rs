//! In-memory company role binding repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, PermissionSet};

use crate::repositories::BindingRepository;

/// Bindings keyed by `(user_id, company_id)`.
#[derive(Debug, Default)]
pub struct MemoryBindingRepository {
    bindings: DashMap<(Uuid, Uuid), CompanyRoleBinding>,
}

impl MemoryBindingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, user_id: Uuid, company_id: Uuid, f: F) -> Option<CompanyRoleBinding>
    where
        F: FnOnce(&mut CompanyRoleBinding),
    {
        self.bindings.get_mut(&(user_id, company_id)).map(|mut b| {
            f(&mut b);
            b.updated_at = Utc::now();
            b.clone()
        })
    }

    fn collect_sorted<P>(&self, predicate: P) -> Vec<CompanyRoleBinding>
    where
        P: Fn(&CompanyRoleBinding) -> bool,
    {
        let mut found: Vec<CompanyRoleBinding> = self
            .bindings
            .iter()
            .filter(|b| predicate(b.value()))
            .map(|b| b.value().clone())
            .collect();
        found.sort_by_key(|b| b.created_at);
        found
    }
}

#[async_trait]
impl BindingRepository for MemoryBindingRepository {
    async fn find(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Option<CompanyRoleBinding>> {
        Ok(self.bindings.get(&(user_id, company_id)).map(|b| b.clone()))
    }

    async fn insert(&self, binding: CompanyRoleBinding) -> AppResult<CompanyRoleBinding> {
        match self.bindings.entry((binding.user_id, binding.company_id)) {
            Entry::Occupied(_) => Err(AppError::coded(
                ErrorKind::Conflict,
                ErrorCode::AlreadyMember,
                "User is already a member of this company",
            )),
            Entry::Vacant(slot) => {
                slot.insert(binding.clone());
                Ok(binding)
            }
        }
    }

    async fn update_role(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        role: CompanyRole,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        Ok(self.modify(user_id, company_id, |b| b.role = role))
    }

    async fn update_level(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        level: i32,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        Ok(self.modify(user_id, company_id, |b| b.level = level))
    }

    async fn update_permissions(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        permissions: &PermissionSet,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        Ok(self.modify(user_id, company_id, |b| {
            b.permissions = permissions.clone()
        }))
    }

    async fn delete(&self, user_id: Uuid, company_id: Uuid) -> AppResult<bool> {
        Ok(self.bindings.remove(&(user_id, company_id)).is_some())
    }

    async fn delete_company(&self, company_id: Uuid) -> AppResult<u64> {
        let before = self.bindings.len();
        self.bindings.retain(|(_, company), _| *company != company_id);
        Ok(before.saturating_sub(self.bindings.len()) as u64)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>> {
        Ok(self.collect_sorted(|b| b.user_id == user_id))
    }

    async fn list_for_company(&self, company_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>> {
        Ok(self.collect_sorted(|b| b.company_id == company_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_is_unique() {
        let repo = MemoryBindingRepository::new();
        let (user, company) = (Uuid::new_v4(), Uuid::new_v4());
        repo.insert(CompanyRoleBinding::new(user, company, CompanyRole::Salesman))
            .await
            .unwrap();
        let err = repo
            .insert(CompanyRoleBinding::new(user, company, CompanyRole::Admin))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyMember);
    }

    #[tokio::test]
    async fn test_delete_company_only_touches_that_company() {
        let repo = MemoryBindingRepository::new();
        let user = Uuid::new_v4();
        let (doomed, kept) = (Uuid::new_v4(), Uuid::new_v4());
        for company in [doomed, kept] {
            repo.insert(CompanyRoleBinding::new(user, company, CompanyRole::Admin))
                .await
                .unwrap();
        }
        repo.insert(CompanyRoleBinding::new(Uuid::new_v4(), doomed, CompanyRole::Salesman))
            .await
            .unwrap();

        assert_eq!(repo.delete_company(doomed).await.unwrap(), 2);
        let remaining = repo.list_for_user(user).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].company_id, kept);
    }

    #[tokio::test]
    async fn test_update_missing_binding_returns_none() {
        let repo = MemoryBindingRepository::new();
        let updated = repo
            .update_level(Uuid::new_v4(), Uuid::new_v4(), 3)
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
