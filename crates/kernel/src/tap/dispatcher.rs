//! Tap dispatcher - invokes plugin taps in weight order.
//!
//! The dispatcher calls all plugins implementing a tap, collecting their results.
//! Errors are logged and skipped, allowing other plugins to continue. The one
//! exception is an access denial from a settings form, which halts the page.

use std::sync::Arc;

use tracing::{debug, error};
use vetrina_sdk::form::Form;
use vetrina_sdk::host::{Host, HostError, HostResult};
use vetrina_sdk::plugin::taps;
use vetrina_sdk::types::{
    EditPanel, HeadElement, Item, MenuDefinition, PageView, SaveEvent, SettingDefinition,
};

use super::{TapHandler, TapRegistry};

/// Dispatcher for invoking taps across plugins.
#[derive(Debug, Clone)]
pub struct TapDispatcher {
    registry: Arc<TapRegistry>,
}

fn log_failure(handler: &TapHandler, tap: &str, e: &HostError) {
    error!(
        plugin = %handler.plugin.name(),
        tap = %tap,
        error = %e,
        "tap invocation failed"
    );
}

impl TapDispatcher {
    pub fn new(registry: Arc<TapRegistry>) -> Self {
        Self { registry }
    }

    /// Get the tap registry for handler introspection.
    pub fn registry(&self) -> &TapRegistry {
        &self.registry
    }

    /// Collect admin pages from every plugin.
    pub fn menus(&self) -> Vec<MenuDefinition> {
        self.registry
            .get_handlers(taps::MENU)
            .iter()
            .flat_map(|h| h.plugin.tap_menu())
            .collect()
    }

    /// Collect setting declarations from every plugin.
    pub fn settings(&self) -> Vec<SettingDefinition> {
        self.registry
            .get_handlers(taps::SETTINGS_INFO)
            .iter()
            .flat_map(|h| h.plugin.tap_settings_info())
            .collect()
    }

    /// Build the settings form for `group`.
    ///
    /// The first plugin to return a form wins. An access denial propagates;
    /// other failures are logged and the next plugin is asked.
    pub async fn settings_form(&self, host: &dyn Host, group: &str) -> HostResult<Option<Form>> {
        for handler in self.registry.get_handlers(taps::SETTINGS_FORM) {
            match handler.plugin.tap_settings_form(host, group).await {
                Ok(Some(form)) => return Ok(Some(form)),
                Ok(None) => {}
                Err(e @ HostError::AccessDenied(_)) => return Err(e),
                Err(e) => log_failure(handler, taps::SETTINGS_FORM, &e),
            }
        }
        Ok(None)
    }

    /// Collect editing-surface panels for an item, ordered by priority
    /// (stable with respect to tap weight).
    pub async fn edit_panels(&self, host: &dyn Host, item: &Item) -> Vec<EditPanel> {
        let handlers = self.registry.get_handlers(taps::ITEM_EDIT_PANELS);
        let mut panels = Vec::new();

        for handler in handlers {
            match handler.plugin.tap_item_edit_panels(host, item).await {
                Ok(mut contributed) => panels.append(&mut contributed),
                Err(e) => log_failure(handler, taps::ITEM_EDIT_PANELS, &e),
            }
        }

        panels.sort_by_key(|p| p.priority);
        debug!(
            tap = taps::ITEM_EDIT_PANELS,
            handlers = handlers.len(),
            panels = panels.len(),
            "dispatch complete"
        );
        panels
    }

    /// Notify every plugin that an item was saved.
    pub async fn item_save(&self, host: &dyn Host, event: &SaveEvent) {
        for handler in self.registry.get_handlers(taps::ITEM_SAVE) {
            if let Err(e) = handler.plugin.tap_item_save(host, event).await {
                log_failure(handler, taps::ITEM_SAVE, &e);
            }
        }
    }

    /// Collect `<head>` elements for a public page, in weight order.
    pub async fn page_head(&self, host: &dyn Host, view: &PageView) -> Vec<HeadElement> {
        let mut elements = Vec::new();

        for handler in self.registry.get_handlers(taps::PAGE_HEAD) {
            match handler.plugin.tap_page_head(host, view).await {
                Ok(mut contributed) => elements.append(&mut contributed),
                Err(e) => log_failure(handler, taps::PAGE_HEAD, &e),
            }
        }

        elements
    }
}
