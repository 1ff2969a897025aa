//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account and its credential state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Lower-cased, unique email address.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Argon2 PHC hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the email address has been confirmed.
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub reset_code: Option<String>,
    #[serde(skip_serializing)]
    pub reset_code_expires_at: Option<DateTime<Utc>>,
    /// Wrong guesses against the current reset code.
    #[serde(skip_serializing)]
    pub reset_code_attempts: i32,
    /// Consecutive failed logins since the last success.
    pub login_attempts: i32,
    /// Account locked until this time (if locked).
    pub lock_until: Option<DateTime<Utc>>,
    /// Administrative block; overrides every other state.
    pub is_blocked: bool,
    /// Platform-wide roles such as `it_support`.
    pub global_roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Whether a lock is in force at `now`. A lock whose time has passed
    /// counts as released but is left in place until the next success.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    /// Check whether the account carries the given platform role.
    pub fn has_global_role(&self, role: &str) -> bool {
        self.global_roles.iter().any(|r| r == role)
    }
}

/// Data required to create a new account.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Pre-hashed password.
    pub password_hash: String,
    pub email_verified: bool,
    pub verification_code: Option<String>,
    pub verification_code_expires_at: Option<DateTime<Utc>>,
    pub global_roles: Vec<String>,
}

impl CreateAccount {
    /// Materialize the account row with fresh identifiers and timestamps.
    pub fn into_account(self) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::now_v7(),
            name: self.name,
            email: normalize_email(&self.email),
            phone: self.phone,
            password_hash: self.password_hash,
            email_verified: self.email_verified,
            verification_code: self.verification_code,
            verification_code_expires_at: self.verification_code_expires_at,
            reset_code: None,
            reset_code_expires_at: None,
            reset_code_attempts: 0,
            login_attempts: 0,
            lock_until: None,
            is_blocked: false,
            global_roles: self.global_roles,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// Lockout counters after an atomic update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LockoutState {
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn sample() -> Account {
        CreateAccount {
            name: "Ada".into(),
            email: "  Ada@Example.COM ".into(),
            phone: None,
            password_hash: "hash".into(),
            email_verified: true,
            verification_code: None,
            verification_code_expires_at: None,
            global_roles: vec!["it_support".into()],
        }
        .into_account()
    }

    #[test]
    fn email_is_normalized_on_create() {
        assert_eq!(sample().email, "ada@example.com");
    }

    #[test]
    fn past_lock_is_not_in_force() {
        let now = Utc::now();
        let mut account = sample();
        account.lock_until = Some(now - Duration::seconds(1));
        assert!(!account.is_locked_at(now));
        account.lock_until = Some(now + Duration::minutes(15));
        assert!(account.is_locked_at(now));
    }

    #[test]
    fn secrets_are_not_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_code").is_none());
        assert!(sample().has_global_role("it_support"));
    }
}
