//! Audit action names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Actions recorded by the identity core.
///
/// Stored as their snake_case name so external collaborators can append
/// their own free-form actions next to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Register,
    EmailVerified,
    LoginSuccess,
    LoginFailed,
    AccountLocked,
    Logout,
    TokenRefreshed,
    RefreshTokenReuse,
    SessionRevoked,
    SessionEvicted,
    PasswordResetRequested,
    PasswordReset,
    PasswordChanged,
    AccountBlocked,
    AccountUnblocked,
    AccountUnlocked,
    AccessDenied,
    UserInvited,
    RoleAssigned,
    LevelAssigned,
    PermissionsUpdated,
    UserRemoved,
    CompanyDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::EmailVerified => "email_verified",
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::AccountLocked => "account_locked",
            Self::Logout => "logout",
            Self::TokenRefreshed => "token_refreshed",
            Self::RefreshTokenReuse => "refresh_token_reuse",
            Self::SessionRevoked => "session_revoked",
            Self::SessionEvicted => "session_evicted",
            Self::PasswordResetRequested => "password_reset_requested",
            Self::PasswordReset => "password_reset",
            Self::PasswordChanged => "password_changed",
            Self::AccountBlocked => "account_blocked",
            Self::AccountUnblocked => "account_unblocked",
            Self::AccountUnlocked => "account_unlocked",
            Self::AccessDenied => "access_denied",
            Self::UserInvited => "user_invited",
            Self::RoleAssigned => "role_assigned",
            Self::LevelAssigned => "level_assigned",
            Self::PermissionsUpdated => "permissions_updated",
            Self::UserRemoved => "user_removed",
            Self::CompanyDeleted => "company_deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
