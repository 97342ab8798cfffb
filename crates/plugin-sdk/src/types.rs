//! Core types for Vetrina plugins.
//!
//! These types are exchanged between plugins and the kernel on every tap
//! invocation. All of them serialize to JSON so the kernel can log or cache
//! them without knowing the plugin.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::form::FormElement;

/// A content item as seen by plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier (UUIDv7, time-sortable).
    pub id: Uuid,

    /// Content type machine name (e.g., "article", "page").
    pub item_type: String,

    /// Item title.
    pub title: String,

    /// Publication status (0 = draft, 1 = published).
    pub status: i16,

    /// Author user ID.
    pub author_id: Uuid,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl Item {
    /// Check if this item is published.
    pub fn is_published(&self) -> bool {
        self.status == 1
    }
}

/// A content type known to the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeInfo {
    /// Machine name (e.g., "article").
    pub machine_name: String,

    /// Human-readable label.
    pub label: String,

    /// Whether items of this type are publicly viewable.
    pub public: bool,
}

impl ContentTypeInfo {
    pub fn new(machine_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            machine_name: machine_name.into(),
            label: label.into(),
            public: true,
        }
    }

    /// Mark the type as internal (not publicly viewable).
    pub fn internal(mut self) -> Self {
        self.public = false;
        self
    }
}

/// Admin page definition returned by `tap_menu`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuDefinition {
    /// Full path of the page (e.g., "/admin/config/custom-css").
    pub path: String,
    /// Menu label.
    pub title: String,
    /// Page heading; falls back to the menu label.
    pub page_title: Option<String>,
    /// Settings group rendered on this page (passed to `tap_settings_form`).
    pub callback: String,
    /// Permission required to view and submit the page.
    pub permission: String,
    /// Parent menu path.
    pub parent: Option<String>,
}

impl MenuDefinition {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            page_title: None,
            callback: String::new(),
            permission: "administer site".into(),
            parent: None,
        }
    }

    pub fn page_title(mut self, page_title: impl Into<String>) -> Self {
        self.page_title = Some(page_title.into());
        self
    }

    pub fn callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = callback.into();
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = permission.into();
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Heading shown on the page itself.
    pub fn heading(&self) -> &str {
        self.page_title.as_deref().unwrap_or(&self.title)
    }
}

/// Shape of a persisted setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    /// Single string value.
    Text,
    /// Array of strings, submitted as a repeated `field[]`.
    List,
}

/// A persisted setting declared by `tap_settings_info`.
///
/// The kernel's generic settings-update endpoint stores every setting of a
/// group when that group's form is submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingDefinition {
    /// Settings group (one group per admin form).
    pub group: String,
    /// Storage key in the site configuration.
    pub name: String,
    /// Form field carrying the value (without the `[]` suffix).
    pub field: String,
    pub kind: SettingKind,
    pub default: serde_json::Value,
}

impl SettingDefinition {
    /// Declare a list setting with an empty default.
    pub fn list(group: &str, name: &str, field: &str) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            field: field.into(),
            kind: SettingKind::List,
            default: serde_json::Value::Array(Vec::new()),
        }
    }

    /// Declare a text setting with an empty default.
    pub fn text(group: &str, name: &str, field: &str) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            field: field.into(),
            kind: SettingKind::Text,
            default: serde_json::Value::String(String::new()),
        }
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = value;
        self
    }
}

/// Where an edit panel is placed on the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelContext {
    Normal,
    Side,
}

/// Ordering of panels within a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPriority {
    High,
    Default,
    Low,
}

/// A panel attached to an item's editing surface by `tap_item_edit_panels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPanel {
    pub id: String,
    pub title: String,
    pub context: PanelContext,
    pub priority: PanelPriority,
    /// Panel body; its named children are submitted with the item form.
    pub element: FormElement,
}

impl EditPanel {
    pub fn new(id: impl Into<String>, title: impl Into<String>, element: FormElement) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            context: PanelContext::Normal,
            priority: PanelPriority::Default,
            element,
        }
    }

    pub fn context(mut self, context: PanelContext) -> Self {
        self.context = context;
        self
    }

    pub fn priority(mut self, priority: PanelPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Payload of `tap_item_save`.
///
/// `values` holds every submitted form field, including plugin panel fields.
/// A field that was not submitted at all is absent from the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEvent {
    pub item: Item,
    /// True for background draft saves.
    #[serde(default)]
    pub autosave: bool,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl SaveEvent {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            autosave: false,
            values: HashMap::new(),
        }
    }

    pub fn autosave(mut self) -> Self {
        self.autosave = true;
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Get a submitted value, `None` when the field was absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// The public page being rendered, passed to `tap_page_head`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageView {
    /// A single item's page.
    Single { item: Item },
    /// A listing: the front page (`item_type: None`) or a type archive.
    Listing { item_type: Option<String> },
}

impl PageView {
    /// The item being viewed, for single-item views.
    pub fn item(&self) -> Option<&Item> {
        match self {
            PageView::Single { item } => Some(item),
            PageView::Listing { .. } => None,
        }
    }
}

/// An element contributed to the page `<head>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeadElement {
    /// Inline `<style type="text/css">` block.
    Style { css: String },
}

impl HeadElement {
    pub fn style(css: impl Into<String>) -> Self {
        HeadElement::Style { css: css.into() }
    }
}

/// Log levels for structured logging from plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}
