//! Response DTOs. None of them carry secrets: password hashes, codes and
//! refresh token digests never leave the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salesdesk_core::types::pagination::PageResponse;
use salesdesk_entity::account::Account;
use salesdesk_entity::audit::AuditEvent;
use salesdesk_entity::company::CompanyRoleBinding;
use salesdesk_entity::session::Session;

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub is_blocked: bool,
    pub is_locked: bool,
    pub lock_until: Option<DateTime<Utc>>,
    pub global_roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            is_locked: account.is_locked(),
            id: account.id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            email_verified: account.email_verified,
            is_blocked: account.is_blocked,
            lock_until: account.lock_until,
            global_roles: account.global_roles,
            created_at: account.created_at,
            last_login_at: account.last_login_at,
        }
    }
}

/// Login result. The refresh token travels only in the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub user: AccountResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// One active refresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session of the refresh cookie on the request.
    pub current: bool,
}

impl SessionResponse {
    pub fn from_session(session: Session, current_digest: Option<&str>) -> Self {
        Self {
            current: current_digest == Some(session.token_digest.as_str()),
            id: session.id,
            user_agent: session.user_agent,
            ip_address: session.ip_address,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingResponse {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: String,
    pub level: i32,
    pub permissions: Vec<String>,
    pub last_assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CompanyRoleBinding> for BindingResponse {
    fn from(binding: CompanyRoleBinding) -> Self {
        Self {
            user_id: binding.user_id,
            company_id: binding.company_id,
            role: binding.role.as_str().to_string(),
            level: binding.level,
            permissions: binding.permissions.to_strings(),
            last_assigned_at: binding.last_assigned_at,
            created_at: binding.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventResponse {
    pub id: Uuid,
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditEvent> for AuditEventResponse {
    fn from(event: AuditEvent) -> Self {
        Self {
            id: event.id,
            action: event.action,
            actor_id: event.actor_id,
            company_id: event.company_id,
            target_id: event.target_id,
            metadata: event.metadata,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            created_at: event.created_at,
        }
    }
}

/// Paginated list payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PagedResponse<T> {
    /// Convert every item of a repository page.
    pub fn map<U>(page: PageResponse<U>, f: impl FnMut(U) -> T) -> Self {
        Self {
            items: page.items.into_iter().map(f).collect(),
            page: page.page,
            limit: page.page_size,
            total: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

/// Liveness payload. `database` is absent for the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<bool>,
    pub lost_audit_events: u64,
}
