//! Account repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_entity::account::{Account, CreateAccount, LockoutState, normalize_email};

use crate::repositories::AccountRepository;

#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn execute_for(&self, id: Uuid, sql: &str, what: &str) -> AppResult<bool> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by id", e)
            })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by email", e)
            })
    }

    async fn create(&self, data: CreateAccount) -> AppResult<Account> {
        let account = data.into_account();
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, name, email, phone, password_hash, email_verified, \
                                   verification_code, verification_code_expires_at, global_roles, \
                                   created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING *",
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.email_verified)
        .bind(&account.verification_code)
        .bind(account.verification_code_expires_at)
        .bind(&account.global_roles)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("accounts_email_key") =>
            {
                AppError::coded(
                    ErrorKind::Conflict,
                    ErrorCode::EmailAlreadyRegistered,
                    "Email is already registered",
                )
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create account", e),
        })
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Account>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count accounts", e))?;

        let accounts = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list accounts", e))?;

        Ok(PageResponse::new(
            accounts,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn record_failed_login(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_for: Duration,
    ) -> AppResult<Option<LockoutState>> {
        // Single statement: the row lock serializes concurrent failures.
        sqlx::query_as::<_, LockoutState>(
            "UPDATE accounts SET \
                 login_attempts = login_attempts + 1, \
                 lock_until = CASE WHEN login_attempts + 1 >= $2 THEN $3 ELSE lock_until END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING login_attempts, lock_until",
        )
        .bind(id)
        .bind(max_attempts)
        .bind(Utc::now() + lock_for)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record failed login", e)
        })
    }

    async fn reset_lockout(&self, id: Uuid) -> AppResult<bool> {
        self.execute_for(
            id,
            "UPDATE accounts SET login_attempts = 0, lock_until = NULL, updated_at = NOW() \
             WHERE id = $1",
            "reset lockout",
        )
        .await
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE accounts SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
            })?;
        Ok(())
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE accounts SET is_blocked = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(blocked)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to update block flag", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_verification_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE accounts SET verification_code = $2, verification_code_expires_at = $3, \
                                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store verification code", e)
        })?;
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> AppResult<()> {
        self.execute_for(
            id,
            "UPDATE accounts SET email_verified = TRUE, verification_code = NULL, \
                                 verification_code_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1",
            "mark email verified",
        )
        .await?;
        Ok(())
    }

    async fn set_reset_code(
        &self,
        id: Uuid,
        code: Option<(&str, DateTime<Utc>)>,
    ) -> AppResult<()> {
        let (code, expires_at) = code.unzip();
        sqlx::query(
            "UPDATE accounts SET reset_code = $2, reset_code_expires_at = $3, \
                                 reset_code_attempts = 0, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store reset code", e))?;
        Ok(())
    }

    async fn record_reset_code_failure(&self, id: Uuid, max_attempts: i32) -> AppResult<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE accounts SET \
                 reset_code_attempts = reset_code_attempts + 1, \
                 reset_code = CASE WHEN reset_code_attempts + 1 >= $2 THEN NULL ELSE reset_code END, \
                 reset_code_expires_at = CASE WHEN reset_code_attempts + 1 >= $2 \
                                              THEN NULL ELSE reset_code_expires_at END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING reset_code_attempts",
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record reset code failure", e)
        })
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, reset_code = NULL, \
                                 reset_code_expires_at = NULL, reset_code_attempts = 0, \
                                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {id} not found"))
                .with_code(ErrorCode::UserNotFound));
        }
        Ok(())
    }
}
