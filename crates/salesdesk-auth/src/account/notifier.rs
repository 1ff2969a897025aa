//! Outbound delivery of verification and reset codes.

use async_trait::async_trait;
use tracing::info;

use salesdesk_core::result::AppResult;
use salesdesk_entity::account::Account;

/// Delivers one-time codes to account holders.
#[async_trait]
pub trait AccountNotifier: Send + Sync + 'static {
    async fn send_verification_code(&self, account: &Account, code: &str) -> AppResult<()>;

    async fn send_reset_code(&self, account: &Account, code: &str) -> AppResult<()>;
}

/// Writes codes to the log instead of sending mail. Development only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl AccountNotifier for LogNotifier {
    async fn send_verification_code(&self, account: &Account, code: &str) -> AppResult<()> {
        info!(account_id = %account.id, email = %account.email, code = %code, "Verification code issued");
        Ok(())
    }

    async fn send_reset_code(&self, account: &Account, code: &str) -> AppResult<()> {
        info!(account_id = %account.id, email = %account.email, code = %code, "Password reset code issued");
        Ok(())
    }
}
