//! Menu registry - collects and manages admin page definitions from plugins.

use std::collections::HashMap;

use tracing::{debug, warn};
use vetrina_sdk::types::MenuDefinition;

/// Path of the options menu plugin settings pages hang under.
pub const CONFIG_PARENT: &str = "/admin/config";

/// Registry of all menu definitions from plugins.
#[derive(Debug, Default)]
pub struct MenuRegistry {
    /// All menu definitions, indexed by path
    menus: HashMap<String, MenuDefinition>,
    /// Menus organized by parent, in registration order
    children: HashMap<String, Vec<String>>,
}

impl MenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from collected `tap_menu` results.
    pub fn from_menus(menus: impl IntoIterator<Item = MenuDefinition>) -> Self {
        let mut registry = Self::new();
        for menu in menus {
            registry.register(menu);
        }
        debug!(menus = registry.len(), "built menu registry");
        registry
    }

    /// Register a menu definition. A later definition for the same path is
    /// ignored.
    pub fn register(&mut self, menu: MenuDefinition) {
        if self.menus.contains_key(&menu.path) {
            warn!(path = %menu.path, "duplicate menu path ignored");
            return;
        }

        if let Some(ref parent) = menu.parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(menu.path.clone());
        }

        self.menus.insert(menu.path.clone(), menu);
    }

    /// Get a menu by its path.
    pub fn get(&self, path: &str) -> Option<&MenuDefinition> {
        self.menus.get(path)
    }

    /// Plugin settings page for `/admin/config/{page}`.
    pub fn config_page(&self, page: &str) -> Option<&MenuDefinition> {
        self.get(&format!("{CONFIG_PARENT}/{page}"))
    }

    /// Get child menus of a parent path, sorted by title.
    pub fn children_of(&self, parent: &str) -> Vec<&MenuDefinition> {
        let mut children: Vec<_> = self
            .children
            .get(parent)
            .map(|paths| paths.iter().filter_map(|p| self.menus.get(p)).collect())
            .unwrap_or_default();
        children.sort_by(|a, b| a.title.cmp(&b.title));
        children
    }

    /// Get menu count.
    pub fn len(&self) -> usize {
        self.menus.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }
}
