//! Company role binding repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use salesdesk_core::error::{AppError, ErrorCode, ErrorKind};
use salesdesk_core::result::AppResult;
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, PermissionSet};

use crate::repositories::BindingRepository;

/// Row shape: role and permissions are stored as text.
#[derive(Debug, FromRow)]
struct BindingRow {
    id: Uuid,
    user_id: Uuid,
    company_id: Uuid,
    role: String,
    level: i32,
    permissions: Vec<String>,
    last_assigned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BindingRow> for CompanyRoleBinding {
    type Error = AppError;

    fn try_from(row: BindingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            company_id: row.company_id,
            role: row.role.parse()?,
            level: row.level,
            permissions: PermissionSet::parse_all(&row.permissions)?,
            last_assigned_at: row.last_assigned_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert(row: Option<BindingRow>) -> AppResult<Option<CompanyRoleBinding>> {
    row.map(CompanyRoleBinding::try_from).transpose()
}

fn convert_all(rows: Vec<BindingRow>) -> AppResult<Vec<CompanyRoleBinding>> {
    rows.into_iter().map(CompanyRoleBinding::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct PgBindingRepository {
    pool: PgPool,
}

impl PgBindingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BindingRepository for PgBindingRepository {
    async fn find(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Option<CompanyRoleBinding>> {
        let row = sqlx::query_as::<_, BindingRow>(
            "SELECT * FROM company_role_bindings WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find binding", e))?;
        convert(row)
    }

    async fn insert(&self, binding: CompanyRoleBinding) -> AppResult<CompanyRoleBinding> {
        let row = sqlx::query_as::<_, BindingRow>(
            "INSERT INTO company_role_bindings (id, user_id, company_id, role, level, permissions, \
                                                last_assigned_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(binding.id)
        .bind(binding.user_id)
        .bind(binding.company_id)
        .bind(binding.role.as_str())
        .bind(binding.level)
        .bind(binding.permissions.to_strings())
        .bind(binding.last_assigned_at)
        .bind(binding.created_at)
        .bind(binding.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("company_role_bindings_user_company_key") =>
            {
                AppError::coded(
                    ErrorKind::Conflict,
                    ErrorCode::AlreadyMember,
                    "User is already a member of this company",
                )
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert binding", e),
        })?;
        CompanyRoleBinding::try_from(row)
    }

    async fn update_role(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        role: CompanyRole,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        let row = sqlx::query_as::<_, BindingRow>(
            "UPDATE company_role_bindings SET role = $3, updated_at = NOW() \
             WHERE user_id = $1 AND company_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update role", e))?;
        convert(row)
    }

    async fn update_level(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        level: i32,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        let row = sqlx::query_as::<_, BindingRow>(
            "UPDATE company_role_bindings SET level = $3, updated_at = NOW() \
             WHERE user_id = $1 AND company_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(level)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update level", e))?;
        convert(row)
    }

    async fn update_permissions(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        permissions: &PermissionSet,
    ) -> AppResult<Option<CompanyRoleBinding>> {
        let row = sqlx::query_as::<_, BindingRow>(
            "UPDATE company_role_bindings SET permissions = $3, updated_at = NOW() \
             WHERE user_id = $1 AND company_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(permissions.to_strings())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update permissions", e)
        })?;
        convert(row)
    }

    async fn delete(&self, user_id: Uuid, company_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM company_role_bindings WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete binding", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_company(&self, company_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM company_role_bindings WHERE company_id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete company bindings", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>> {
        let rows = sqlx::query_as::<_, BindingRow>(
            "SELECT * FROM company_role_bindings WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bindings", e))?;
        convert_all(rows)
    }

    async fn list_for_company(&self, company_id: Uuid) -> AppResult<Vec<CompanyRoleBinding>> {
        let rows = sqlx::query_as::<_, BindingRow>(
            "SELECT * FROM company_role_bindings WHERE company_id = $1 ORDER BY created_at ASC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list members", e))?;
        convert_all(rows)
    }
}
