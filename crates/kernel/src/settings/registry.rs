//! Settings registry and submission handling.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;
use vetrina_sdk::types::{SettingDefinition, SettingKind};

/// Declared settings, grouped by settings group.
#[derive(Debug, Default)]
pub struct SettingsRegistry {
    groups: HashMap<String, Vec<SettingDefinition>>,
}

impl SettingsRegistry {
    pub fn from_definitions(definitions: impl IntoIterator<Item = SettingDefinition>) -> Self {
        let mut groups: HashMap<String, Vec<SettingDefinition>> = HashMap::new();
        for definition in definitions {
            groups
                .entry(definition.group.clone())
                .or_default()
                .push(definition);
        }
        debug!(groups = groups.len(), "built settings registry");
        Self { groups }
    }

    /// Settings in a group (empty for unknown groups).
    pub fn group(&self, group: &str) -> &[SettingDefinition] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Values to store for each setting of a group, from form-encoded pairs.
///
/// List settings collect every `field[]` value in submission order; none
/// submitted stores the empty list. Text settings take the last `field`
/// value, or the declared default when absent.
pub fn values_from_submission(
    definitions: &[SettingDefinition],
    pairs: &[(String, String)],
) -> Vec<(String, Value)> {
    definitions
        .iter()
        .map(|def| {
            let value = match def.kind {
                SettingKind::List => {
                    let key = format!("{}[]", def.field);
                    Value::Array(
                        pairs
                            .iter()
                            .filter(|(k, _)| *k == key)
                            .map(|(_, v)| Value::String(v.clone()))
                            .collect(),
                    )
                }
                SettingKind::Text => pairs
                    .iter()
                    .rev()
                    .find(|(k, _)| *k == def.field)
                    .map(|(_, v)| Value::String(v.clone()))
                    .unwrap_or_else(|| def.default.clone()),
            };
            (def.name.clone(), value)
        })
        .collect()
}
