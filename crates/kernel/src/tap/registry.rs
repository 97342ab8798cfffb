//! Tap registry - indexes which plugins implement which taps.
//!
//! Plugins declare `(tap, weight)` registrations; the registry resolves them
//! once at startup into an ordered handler list per tap.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use vetrina_sdk::plugin::{Plugin, taps};

/// A registered tap handler with plugin reference and priority.
#[derive(Clone)]
pub struct TapHandler {
    /// The plugin that implements this tap.
    pub plugin: Arc<dyn Plugin>,
    /// Weight for ordering (lower = higher priority).
    pub weight: i32,
}

impl std::fmt::Debug for TapHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapHandler")
            .field("plugin", &self.plugin.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Registry mapping tap names to ordered handlers.
///
/// When a tap is invoked, handlers are called in weight order.
/// Multiple plugins can implement the same tap.
#[derive(Debug, Default)]
pub struct TapRegistry {
    handlers: HashMap<&'static str, Vec<TapHandler>>,
}

impl TapRegistry {
    /// Build a tap registry from plugins.
    ///
    /// Handlers are sorted by weight; plugins with equal weight keep their
    /// registration order. Registrations for unknown taps are ignored.
    pub fn from_plugins(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        let mut handlers: HashMap<&'static str, Vec<TapHandler>> = HashMap::new();
        let plugin_count = plugins.len();

        for plugin in plugins {
            for registration in plugin.taps() {
                if !taps::ALL.contains(&registration.tap) {
                    warn!(
                        plugin = %plugin.name(),
                        tap = %registration.tap,
                        "ignoring registration for unknown tap"
                    );
                    continue;
                }

                handlers
                    .entry(registration.tap)
                    .or_default()
                    .push(TapHandler {
                        plugin: Arc::clone(&plugin),
                        weight: registration.weight,
                    });
            }
        }

        for handlers_list in handlers.values_mut() {
            handlers_list.sort_by_key(|h| h.weight);
        }

        info!(
            plugins = plugin_count,
            taps = handlers.len(),
            "tap registry built"
        );

        Self { handlers }
    }

    /// Get handlers for a tap, in weight order.
    ///
    /// Returns an empty slice if no plugins implement the tap.
    pub fn get_handlers(&self, tap_name: &str) -> &[TapHandler] {
        self.handlers
            .get(tap_name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests {
    use vetrina_sdk::plugin::TapRegistration;

    use super::*;

    /// A plugin that only declares registrations.
    pub(crate) struct Declares {
        pub name: &'static str,
        pub taps: Vec<TapRegistration>,
    }

    #[vetrina_sdk::async_trait]
    impl Plugin for Declares {
        fn name(&self) -> &str {
            self.name
        }

        fn taps(&self) -> Vec<TapRegistration> {
            self.taps.clone()
        }
    }

    fn plugin(name: &'static str, taps: Vec<TapRegistration>) -> Arc<dyn Plugin> {
        Arc::new(Declares { name, taps })
    }

    #[test]
    fn registry_from_no_plugins() {
        let registry = TapRegistry::from_plugins(Vec::new());

        for tap in taps::ALL {
            assert!(registry.get_handlers(tap).is_empty());
        }
    }

    #[test]
    fn handlers_sorted_by_weight() {
        let registry = TapRegistry::from_plugins(vec![
            plugin("late", vec![TapRegistration::new(taps::PAGE_HEAD).weight(999)]),
            plugin("early", vec![TapRegistration::new(taps::PAGE_HEAD).weight(-5)]),
            plugin("default", vec![TapRegistration::new(taps::PAGE_HEAD)]),
        ]);

        let names: Vec<_> = registry
            .get_handlers(taps::PAGE_HEAD)
            .iter()
            .map(|h| h.plugin.name().to_string())
            .collect();
        assert_eq!(names, vec!["early", "default", "late"]);
    }

    #[test]
    fn equal_weights_keep_registration_order() {
        let registry = TapRegistry::from_plugins(vec![
            plugin("first", vec![TapRegistration::new(taps::ITEM_SAVE)]),
            plugin("second", vec![TapRegistration::new(taps::ITEM_SAVE)]),
        ]);

        let handlers = registry.get_handlers(taps::ITEM_SAVE);
        assert_eq!(handlers[0].plugin.name(), "first");
        assert_eq!(handlers[1].plugin.name(), "second");
    }

    #[test]
    fn unknown_taps_are_ignored() {
        let registry = TapRegistry::from_plugins(vec![plugin(
            "odd",
            vec![
                TapRegistration::new("tap_nonexistent"),
                TapRegistration::new(taps::MENU),
            ],
        )]);

        assert!(registry.get_handlers("tap_nonexistent").is_empty());
        assert_eq!(registry.get_handlers(taps::MENU).len(), 1);
        assert_eq!(registry.handlers.len(), 1);
    }
}
