//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use salesdesk_core::types::pagination::PageRequest;
use salesdesk_entity::audit::AuditFilter;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
}

/// Email verification with the 6-digit code.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must have 6 digits"))]
    pub code: String,
}

/// Body carrying only an email: resend verification, forgot password.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResetCodeRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must have 6 digits"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must have 6 digits"))]
    pub code: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Password change for the authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Add an account to a company. `role` defaults to Salesman.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LevelRequest {
    #[validate(range(min = 1, message = "Level must be at least 1"))]
    pub level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsRequest {
    pub permissions: Vec<String>,
}

/// Query string of the audit log endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub action: Option<String>,
    pub actor_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditLogQuery {
    /// `default_limit` applies when the query has no `limit`.
    pub fn page_request(&self, default_limit: u64) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(default_limit))
    }

    pub fn filter(&self) -> AuditFilter {
        AuditFilter {
            action: self.action.clone().filter(|a| !a.is_empty()),
            actor_id: self.actor_id,
            company_id: self.company_id,
            target_id: self.target_id,
            from: self.from,
            to: self.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use salesdesk_core::types::pagination::DEFAULT_PAGE_SIZE;
    use validator::Validate;

    use super::*;

    #[test]
    fn register_request_reads_camel_case() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "ana@example.com",
            "password": "x",
        }))
        .unwrap();
        assert!(req.phone.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let req = EmailRequest { email: "not-an-email".into() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn audit_query_defaults_to_first_page() {
        let query = AuditLogQuery::default();
        let page = query.page_request(DEFAULT_PAGE_SIZE);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
        assert!(query.filter().action.is_none());
    }
}
