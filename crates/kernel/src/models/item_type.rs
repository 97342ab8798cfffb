//! Content type records.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use vetrina_sdk::types::ContentTypeInfo;

/// Content type record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemType {
    /// Machine name (e.g., "article", "page").
    /// Note: Database column is "type", queries must use "type as type_name" alias.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Human-readable label.
    pub label: String,

    /// Description for admin UI.
    pub description: String,

    /// Whether items of this type are publicly viewable.
    pub public: bool,
}

impl ItemType {
    /// List all content types.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let types = sqlx::query_as::<_, ItemType>(
            "SELECT type as type_name, label, description, public FROM item_type ORDER BY type",
        )
        .fetch_all(pool)
        .await
        .context("failed to list item types")?;

        Ok(types)
    }

    /// The plugin-facing view of this type.
    pub fn info(&self) -> ContentTypeInfo {
        let info = ContentTypeInfo::new(&self.type_name, &self.label);
        if self.public { info } else { info.internal() }
    }
}
