//! Site configuration: named JSON values.
//!
//! Plugin settings are stored here by the generic settings endpoint and read
//! back through `Host::variable_get`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Site name used until one is configured.
pub const DEFAULT_SITE_NAME: &str = "Vetrina";

/// Site configuration record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteConfig {
    /// Configuration key.
    pub key: String,

    /// Configuration value (JSON).
    pub value: serde_json::Value,

    /// When this config was last updated.
    pub updated: chrono::DateTime<chrono::Utc>,
}

impl SiteConfig {
    /// Get a configuration value by key.
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<serde_json::Value>> {
        let result = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM site_config WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("failed to get site config")?;

        Ok(result)
    }

    /// Set a configuration value, replacing any previous value.
    pub async fn set(pool: &PgPool, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO site_config (key, value, updated)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = $2, updated = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .context("failed to set site config")?;

        Ok(())
    }

    /// Get the site name.
    pub async fn site_name(pool: &PgPool) -> Result<String> {
        let value = Self::get(pool, "site_name").await?;
        Ok(value
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()))
    }
}
