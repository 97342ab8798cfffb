//! Content type registry.
//!
//! Content types are loaded from the database at startup and cached in
//! memory for fast access.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use sqlx::PgPool;
use tracing::info;
use vetrina_sdk::types::ContentTypeInfo;

use crate::models::ItemType;

/// Registry of content types.
#[derive(Clone, Default)]
pub struct ContentTypeRegistry {
    types: Arc<DashMap<String, ItemType>>,
}

impl ContentTypeRegistry {
    /// Load every content type from the database.
    pub async fn load(pool: &PgPool) -> Result<Self> {
        let registry = Self::from_types(ItemType::list(pool).await?);
        info!(count = registry.len(), "content types loaded");
        Ok(registry)
    }

    /// Build a registry from known types.
    pub fn from_types(types: impl IntoIterator<Item = ItemType>) -> Self {
        let map = DashMap::new();
        for item_type in types {
            map.insert(item_type.type_name.clone(), item_type);
        }
        Self {
            types: Arc::new(map),
        }
    }

    /// Get a content type by machine name.
    pub fn get(&self, type_name: &str) -> Option<ItemType> {
        self.types.get(type_name).map(|t| t.clone())
    }

    pub fn exists(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// All types, sorted by machine name.
    pub fn list(&self) -> Vec<ItemType> {
        let mut types: Vec<_> = self.types.iter().map(|t| t.value().clone()).collect();
        types.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        types
    }

    /// Publicly viewable types, sorted by machine name.
    pub fn public_types(&self) -> Vec<ContentTypeInfo> {
        self.list()
            .into_iter()
            .filter(|t| t.public)
            .map(|t| t.info())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn item_type(name: &str, public: bool) -> ItemType {
        ItemType {
            type_name: name.into(),
            label: name.to_uppercase(),
            description: String::new(),
            public,
        }
    }

    #[test]
    fn public_types_are_sorted_and_filtered() {
        let registry = ContentTypeRegistry::from_types([
            item_type("page", true),
            item_type("block", false),
            item_type("article", true),
        ]);

        let names: Vec<_> = registry
            .public_types()
            .into_iter()
            .map(|t| t.machine_name)
            .collect();
        assert_eq!(names, vec!["article", "page"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.exists("block"));
        assert!(registry.get("missing").is_none());
    }
}
