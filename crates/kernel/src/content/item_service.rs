//! Item service with tap integration.
//!
//! Provides CRUD operations for items. Every save, including background
//! autosaves, is followed by a `tap_item_save` dispatch carrying all
//! submitted form values.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use vetrina_sdk::types::SaveEvent;

use crate::models::{CreateItem, Item, UpdateItem};
use crate::tap::{RequestState, TapDispatcher};

/// Whether a save was requested by the editor or made in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Explicit,
    Autosave,
}

/// Service for item CRUD operations with tap integration.
#[derive(Clone)]
pub struct ItemService {
    inner: Arc<ItemServiceInner>,
}

struct ItemServiceInner {
    pool: PgPool,
    dispatcher: TapDispatcher,
}

impl ItemService {
    pub fn new(pool: PgPool, dispatcher: TapDispatcher) -> Self {
        Self {
            inner: Arc::new(ItemServiceInner { pool, dispatcher }),
        }
    }

    /// Load an item by ID.
    pub async fn load(&self, id: Uuid) -> Result<Option<Item>> {
        Item::find_by_id(&self.inner.pool, id).await
    }

    /// Published items, newest first, optionally of one type.
    pub async fn list_published(&self, item_type: Option<&str>, limit: i64) -> Result<Vec<Item>> {
        Item::list_published(&self.inner.pool, item_type, limit).await
    }

    /// Create an item and notify plugins.
    pub async fn create(
        &self,
        input: CreateItem,
        state: &RequestState,
        values: HashMap<String, String>,
    ) -> Result<Item> {
        let item = Item::create(&self.inner.pool, input).await?;
        info!(item_id = %item.id, item_type = %item.item_type, "item created");

        self.dispatch_save(&item, state, values, SaveKind::Explicit)
            .await;
        Ok(item)
    }

    /// Update an item and notify plugins. Returns `None` if the item is gone.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateItem,
        state: &RequestState,
        values: HashMap<String, String>,
        kind: SaveKind,
    ) -> Result<Option<Item>> {
        let Some(item) = Item::update(&self.inner.pool, id, input).await? else {
            return Ok(None);
        };
        info!(item_id = %item.id, autosave = kind == SaveKind::Autosave, "item updated");

        self.dispatch_save(&item, state, values, kind).await;
        Ok(Some(item))
    }

    async fn dispatch_save(
        &self,
        item: &Item,
        state: &RequestState,
        values: HashMap<String, String>,
        kind: SaveKind,
    ) {
        let event = SaveEvent {
            item: item.to_sdk(),
            autosave: kind == SaveKind::Autosave,
            values,
        };
        self.inner.dispatcher.item_save(state, &event).await;
    }
}
