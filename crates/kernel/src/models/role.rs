//! Role and permission models.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Well-known role IDs.
pub mod well_known {
    use uuid::Uuid;

    /// Anonymous user role (assigned to unauthenticated users).
    pub const ANONYMOUS_ROLE_ID: Uuid = Uuid::from_u128(1);

    /// Authenticated user role (assigned to all logged-in users).
    pub const AUTHENTICATED_ROLE_ID: Uuid = Uuid::from_u128(2);
}

/// Role record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub created: DateTime<Utc>,
}

impl Role {
    /// Get all permissions for this role.
    pub async fn get_permissions(pool: &PgPool, role_id: Uuid) -> Result<Vec<String>> {
        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT permission FROM role_permissions WHERE role_id = $1",
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
        .context("failed to get role permissions")?;

        Ok(permissions)
    }

    /// Get all permissions for a user (aggregated from all their roles).
    pub async fn get_user_permissions(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>> {
        let permissions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT rp.permission
            FROM role_permissions rp
            JOIN user_roles ur ON rp.role_id = ur.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("failed to get user permissions")?;

        Ok(permissions)
    }
}
