//! Audit event repository backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use salesdesk_core::error::{AppError, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_core::types::pagination::{PageRequest, PageResponse};
use salesdesk_entity::audit::{AuditEvent, AuditFilter};

use crate::repositories::AuditRepository;

#[derive(Debug, Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Build the WHERE clause for a filter, numbering placeholders from `$1`.
/// Returns the clause and the next free placeholder index.
fn where_clause(filter: &AuditFilter) -> (String, u32) {
    let mut conditions = Vec::new();
    let mut param_idx = 1u32;

    let mut push = |column: &str, op: &str| {
        conditions.push(format!("{column} {op} ${param_idx}"));
        param_idx += 1;
    };

    if filter.action.is_some() {
        push("action", "=");
    }
    if filter.actor_id.is_some() {
        push("actor_id", "=");
    }
    if filter.company_id.is_some() {
        push("company_id", "=");
    }
    if filter.target_id.is_some() {
        push("target_id", "=");
    }
    if filter.from.is_some() {
        push("created_at", ">=");
    }
    if filter.to.is_some() {
        push("created_at", "<=");
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, param_idx)
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, event: &AuditEvent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO audit_events (id, action, actor_id, company_id, target_id, metadata, \
                                       ip_address, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(event.id)
        .bind(&event.action)
        .bind(event.actor_id)
        .bind(event.company_id)
        .bind(event.target_id)
        .bind(&event.metadata)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert audit event", e))?;
        Ok(())
    }

    async fn search(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>> {
        let (clause, param_idx) = where_clause(filter);

        let count_sql = format!("SELECT COUNT(*) FROM audit_events {clause}");
        let select_sql = format!(
            "SELECT * FROM audit_events {clause} ORDER BY created_at DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, AuditEvent>(&select_sql);

        if let Some(action) = &filter.action {
            count_query = count_query.bind(action.clone());
            select_query = select_query.bind(action.clone());
        }
        for id in [filter.actor_id, filter.company_id, filter.target_id]
            .into_iter()
            .flatten()
        {
            count_query = count_query.bind(id);
            select_query = select_query.bind(id);
        }
        for bound in [filter.from, filter.to].into_iter().flatten() {
            count_query = count_query.bind(bound);
            select_query = select_query.bind(bound);
        }

        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit events", e)
        })?;

        let events = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search audit events", e)
            })?;

        Ok(PageResponse::new(
            events,
            page.page,
            page.page_size,
            total as u64,
        ))
    }
}
