//! Company role binding entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::{Permission, PermissionSet};
use super::role::CompanyRole;

/// Membership of one account in one company. `(user_id, company_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRoleBinding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: CompanyRole,
    /// Independently settable; starts at 1 regardless of role.
    pub level: i32,
    pub permissions: PermissionSet,
    /// Round-robin lead assignment cursor, maintained by the leads module.
    pub last_assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyRoleBinding {
    /// A fresh binding at level 1 with no permission flags.
    pub fn new(user_id: Uuid, company_id: Uuid, role: CompanyRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            company_id,
            role,
            level: 1,
            permissions: PermissionSet::new(),
            last_assigned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the level alone meets the default level of the bound role.
    pub fn meets_role_level(&self) -> bool {
        self.level >= self.role.default_level()
    }
}
