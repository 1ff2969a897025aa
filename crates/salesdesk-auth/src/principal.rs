//! The authenticated caller.

use serde::Serialize;
use uuid::Uuid;

use salesdesk_entity::account::Account;

/// Identity resolved from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub global_roles: Vec<String>,
}

impl Principal {
    pub fn has_global_role(&self, role: &str) -> bool {
        self.global_roles.iter().any(|r| r == role)
    }
}

impl From<&Account> for Principal {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            email: account.email.clone(),
            global_roles: account.global_roles.clone(),
        }
    }
}
