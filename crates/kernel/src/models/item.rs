//! Item model and CRUD operations.
//!
//! Items are the content records of the site. Plugin-owned attributes live
//! alongside in `item_meta`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const ITEM_COLUMNS: &str = "id, type, title, body, author_id, status, created, changed";

/// Item record (content record).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Content type machine name.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: String,

    pub title: String,

    pub body: String,

    pub author_id: Uuid,

    /// Publication status (0 = unpublished, 1 = published).
    pub status: i16,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a new item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub item_type: String,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub status: Option<i16>,
}

/// Input for updating an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItem {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<i16>,
}

impl Item {
    /// Check if this item is published.
    pub fn is_published(&self) -> bool {
        self.status == 1
    }

    /// The plugin-facing view of this item.
    pub fn to_sdk(&self) -> vetrina_sdk::types::Item {
        vetrina_sdk::types::Item {
            id: self.id,
            item_type: self.item_type.clone(),
            title: self.title.clone(),
            status: self.status,
            author_id: self.author_id,
            created: self.created,
            changed: self.changed,
        }
    }

    /// Find an item by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch item by id")?;

        Ok(item)
    }

    /// List published items, newest first, optionally of one type.
    pub async fn list_published(
        pool: &PgPool,
        item_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM item \
             WHERE status = 1 AND ($1::text IS NULL OR type = $1) \
             ORDER BY created DESC LIMIT $2"
        ))
        .bind(item_type)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("failed to list published items")?;

        Ok(items)
    }

    /// Create a new item.
    pub async fn create(pool: &PgPool, input: CreateItem) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let item = sqlx::query_as::<_, Item>(&format!(
            "INSERT INTO item ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.item_type)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.author_id)
        .bind(input.status.unwrap_or(1))
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create item")?;

        Ok(item)
    }

    /// Update an item. Unset fields keep their current value.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateItem) -> Result<Option<Self>> {
        let now = chrono::Utc::now().timestamp();

        let item = sqlx::query_as::<_, Item>(&format!(
            "UPDATE item SET \
                title = COALESCE($2, title), \
                body = COALESCE($3, body), \
                status = COALESCE($4, status), \
                changed = $5 \
             WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(input.title)
        .bind(input.body)
        .bind(input.status)
        .bind(now)
        .fetch_optional(pool)
        .await
        .context("failed to update item")?;

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdk_view_matches_record() {
        let item = Item {
            id: Uuid::now_v7(),
            item_type: "page".into(),
            title: "About".into(),
            body: "Hello".into(),
            author_id: Uuid::nil(),
            status: 0,
            created: 10,
            changed: 20,
        };

        let sdk = item.to_sdk();
        assert_eq!(sdk.id, item.id);
        assert_eq!(sdk.item_type, "page");
        assert_eq!(sdk.changed, 20);
        assert!(!sdk.is_published());
        assert!(!item.is_published());
    }
}
