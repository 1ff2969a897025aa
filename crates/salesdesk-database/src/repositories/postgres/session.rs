//! Session repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use salesdesk_core::error::{AppError, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_entity::session::Session;

use crate::repositories::SessionRepository;

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(what: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, what, e)
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert_capped(&self, session: Session, cap: usize) -> AppResult<Vec<Session>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin session transaction"))?;

        // Serialize session-list changes per account on the account row.
        sqlx::query("SELECT id FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(session.account_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err("Failed to lock account for session insert"))?;

        sqlx::query(
            "INSERT INTO sessions (id, account_id, token_digest, user_agent, ip_address, \
                                   created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.id)
        .bind(session.account_id)
        .bind(&session.token_digest)
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to insert session"))?;

        let evicted = if cap > 0 {
            sqlx::query_as::<_, Session>(
                "DELETE FROM sessions WHERE id IN ( \
                     SELECT id FROM sessions WHERE account_id = $1 \
                     ORDER BY created_at DESC, id DESC OFFSET $2 \
                 ) RETURNING *",
            )
            .bind(session.account_id)
            .bind(cap as i64)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("Failed to evict old sessions"))?
        } else {
            Vec::new()
        };

        tx.commit()
            .await
            .map_err(db_err("Failed to commit session insert"))?;
        Ok(evicted)
    }

    async fn find_by_digest(&self, token_digest: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_digest = $1")
            .bind(token_digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find session by token"))
    }

    async fn replace_token(
        &self,
        account_id: Uuid,
        old_digest: &str,
        new_digest: &str,
        new_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        // The WHERE on the old digest makes this a compare-and-swap: of two
        // racing rotations only the first matches a row.
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET token_digest = $3, expires_at = $4 \
             WHERE account_id = $1 AND token_digest = $2 \
             RETURNING *",
        )
        .bind(account_id)
        .bind(old_digest)
        .bind(new_digest)
        .bind(new_expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to rotate session token"))
    }

    async fn remove_by_digest(
        &self,
        account_id: Uuid,
        token_digest: &str,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "DELETE FROM sessions WHERE account_id = $1 AND token_digest = $2 RETURNING *",
        )
        .bind(account_id)
        .bind(token_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to remove session"))
    }

    async fn remove_by_id(&self, account_id: Uuid, session_id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "DELETE FROM sessions WHERE account_id = $1 AND id = $2 RETURNING *",
        )
        .bind(account_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to remove session"))
    }

    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE account_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list sessions"))
    }

    async fn remove_all(&self, account_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>("DELETE FROM sessions WHERE account_id = $1 RETURNING *")
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to remove sessions"))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge expired sessions"))?;
        Ok(result.rows_affected())
    }
}
