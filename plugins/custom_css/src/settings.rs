//! The content types that take per-item CSS.

use std::collections::BTreeSet;

use serde_json::Value;
use vetrina_sdk::prelude::*;

use crate::{POST_TYPES_FIELD, POST_TYPES_OPTION, SETTINGS_GROUP};

/// Selected content types, loaded from site configuration.
///
/// Missing or malformed stored values load as the empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssSettings {
    pub post_types: BTreeSet<String>,
}

impl CssSettings {
    /// The setting as declared to the kernel's settings registry.
    pub fn definition() -> SettingDefinition {
        SettingDefinition::list(SETTINGS_GROUP, POST_TYPES_OPTION, POST_TYPES_FIELD)
    }

    pub async fn load(host: &dyn Host) -> HostResult<Self> {
        let value = host.variable_get(POST_TYPES_OPTION).await?;
        Ok(Self::from_value(value.as_ref()))
    }

    pub fn is_enabled(&self, item_type: &str) -> bool {
        self.post_types.contains(item_type)
    }

    fn from_value(value: Option<&Value>) -> Self {
        let post_types = value
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self { post_types }
    }
}
