//! Per-item attributes.
//!
//! Free-form string values keyed by `(item_id, meta_key)`. Plugins own
//! their keys (e.g. `_custom_css`); rows are removed with their item.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ItemMeta;

impl ItemMeta {
    /// Read one attribute.
    pub async fn get(pool: &PgPool, item_id: Uuid, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT meta_value FROM item_meta WHERE item_id = $1 AND meta_key = $2",
        )
        .bind(item_id)
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("failed to get item meta")?;

        Ok(value)
    }

    /// Write one attribute, replacing any previous value.
    pub async fn set(pool: &PgPool, item_id: Uuid, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO item_meta (item_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, meta_key) DO UPDATE SET meta_value = EXCLUDED.meta_value
            "#,
        )
        .bind(item_id)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .context("failed to set item meta")?;

        Ok(())
    }
}
