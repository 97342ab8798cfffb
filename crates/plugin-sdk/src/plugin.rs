//! The plugin contract.
//!
//! A plugin implements one method per lifecycle tap and lists the taps it
//! implements (with a weight) in [`Plugin::taps`]. The kernel resolves those
//! registrations once at startup and only calls the taps a plugin declared.
//! Lower weights run first.

use async_trait::async_trait;

use crate::form::Form;
use crate::host::{Host, HostResult};
use crate::types::{
    EditPanel, HeadElement, Item, MenuDefinition, PageView, SaveEvent, SettingDefinition,
};

/// Tap names.
pub mod taps {
    /// Admin menu construction.
    pub const MENU: &str = "tap_menu";
    /// Settings registration.
    pub const SETTINGS_INFO: &str = "tap_settings_info";
    /// Settings page rendering.
    pub const SETTINGS_FORM: &str = "tap_settings_form";
    /// Editing-surface construction.
    pub const ITEM_EDIT_PANELS: &str = "tap_item_edit_panels";
    /// Item save.
    pub const ITEM_SAVE: &str = "tap_item_save";
    /// Public page head rendering.
    pub const PAGE_HEAD: &str = "tap_page_head";

    /// Every tap the kernel dispatches.
    pub const ALL: &[&str] = &[
        MENU,
        SETTINGS_INFO,
        SETTINGS_FORM,
        ITEM_EDIT_PANELS,
        ITEM_SAVE,
        PAGE_HEAD,
    ];
}

/// A plugin's registration for one tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapRegistration {
    pub tap: &'static str,
    /// Ordering weight (lower = called first).
    pub weight: i32,
}

impl TapRegistration {
    pub fn new(tap: &'static str) -> Self {
        Self { tap, weight: 0 }
    }

    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }
}

/// A Vetrina plugin.
///
/// Every tap method has a no-op default; override the ones listed in
/// [`Plugin::taps`].
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Machine name of the plugin.
    fn name(&self) -> &str;

    /// The taps this plugin implements.
    fn taps(&self) -> Vec<TapRegistration>;

    /// Admin pages contributed by the plugin.
    fn tap_menu(&self) -> Vec<MenuDefinition> {
        Vec::new()
    }

    /// Persisted settings declared by the plugin.
    fn tap_settings_info(&self) -> Vec<SettingDefinition> {
        Vec::new()
    }

    /// Build the settings form for `group`, or `None` if the group belongs
    /// to another plugin.
    async fn tap_settings_form(&self, _host: &dyn Host, _group: &str) -> HostResult<Option<Form>> {
        Ok(None)
    }

    /// Panels to attach to an item's editing surface.
    async fn tap_item_edit_panels(
        &self,
        _host: &dyn Host,
        _item: &Item,
    ) -> HostResult<Vec<EditPanel>> {
        Ok(Vec::new())
    }

    /// React to an item being saved.
    async fn tap_item_save(&self, _host: &dyn Host, _event: &SaveEvent) -> HostResult<()> {
        Ok(())
    }

    /// Elements to add to a public page's `<head>`.
    async fn tap_page_head(
        &self,
        _host: &dyn Host,
        _view: &PageView,
    ) -> HostResult<Vec<HeadElement>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_defaults_to_zero_weight() {
        let reg = TapRegistration::new(taps::PAGE_HEAD);
        assert_eq!(reg.weight, 0);
        assert_eq!(reg.clone().weight(999).weight, 999);
    }

    #[test]
    fn all_taps_are_distinct() {
        let mut names = taps::ALL.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), taps::ALL.len());
    }
}
