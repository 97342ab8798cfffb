//! Form and form element types.
//!
//! Plugins describe forms declaratively; the kernel renders them through
//! its theme templates and processes the submissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete form definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    /// Unique form identifier. Settings forms use their settings group.
    pub form_id: String,

    /// Form action URL.
    pub action: String,

    /// HTTP method ("post" or "get").
    pub method: String,

    /// Form elements keyed by name.
    pub elements: BTreeMap<String, FormElement>,

    /// CSRF token for form submission (filled in by the kernel).
    pub token: String,

    /// Optional form title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Form {
    /// Create a new form with the given ID.
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            action: String::new(),
            method: "post".to_string(),
            elements: BTreeMap::new(),
            token: String::new(),
            title: None,
            description: None,
        }
    }

    /// Set the form action URL.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Set the form method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the form title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the form description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an element to the form.
    pub fn element(mut self, name: impl Into<String>, element: FormElement) -> Self {
        self.elements.insert(name.into(), element);
        self
    }

    /// Add multiple elements.
    pub fn elements(mut self, elements: impl IntoIterator<Item = (String, FormElement)>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Get elements sorted by weight.
    pub fn sorted_elements(&self) -> Vec<(&String, &FormElement)> {
        let mut elements: Vec<_> = self.elements.iter().collect();
        elements.sort_by_key(|(_, el)| el.weight);
        elements
    }
}

/// A form element definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormElement {
    /// Element type with type-specific configuration.
    #[serde(flatten)]
    pub element_type: ElementType,

    /// Element title/label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Element description/help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default value. Checkboxes take an array of checked option values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Whether this field is required.
    #[serde(default)]
    pub required: bool,

    /// Sort weight (lower = appears first).
    #[serde(default)]
    pub weight: i32,

    /// Additional HTML attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Child elements (for fieldsets).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, FormElement>,
}

impl FormElement {
    /// Create a textfield element.
    pub fn textfield() -> Self {
        Self::new(ElementType::Textfield { max_length: None })
    }

    /// Create a textarea element.
    pub fn textarea(rows: u32) -> Self {
        Self::new(ElementType::Textarea { rows })
    }

    /// Create a checkboxes group from `(value, label)` pairs.
    pub fn checkboxes(options: Vec<(String, String)>) -> Self {
        Self::new(ElementType::Checkboxes { options })
    }

    /// Create a hidden field.
    pub fn hidden(value: impl Into<String>) -> Self {
        Self::new(ElementType::Hidden).default_value(Value::String(value.into()))
    }

    /// Create a password field.
    pub fn password() -> Self {
        Self::new(ElementType::Password)
    }

    /// Create a submit button.
    pub fn submit(value: impl Into<String>) -> Self {
        Self::new(ElementType::Submit {
            value: value.into(),
        })
    }

    /// Create a fieldset.
    pub fn fieldset() -> Self {
        Self::new(ElementType::Fieldset)
    }

    /// Create a markup element (display-only, already-safe HTML).
    pub fn markup(value: impl Into<String>) -> Self {
        Self::new(ElementType::Markup {
            value: value.into(),
        })
    }

    /// Create a new element with the given type.
    fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            title: None,
            description: None,
            default_value: None,
            required: false,
            weight: 0,
            attributes: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Set the element title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the element description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the weight.
    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Set an HTML attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set max length for textfield.
    pub fn max_length(mut self, max: usize) -> Self {
        if let ElementType::Textfield { ref mut max_length } = self.element_type {
            *max_length = Some(max);
        }
        self
    }

    /// Add a child element.
    pub fn child(mut self, name: impl Into<String>, element: FormElement) -> Self {
        self.children.insert(name.into(), element);
        self
    }

    /// Default value as a string (empty when unset or not a string).
    pub fn default_str(&self) -> &str {
        self.default_value
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Whether a checkboxes option is checked by the default value.
    pub fn is_checked(&self, option: &str) -> bool {
        self.default_value
            .as_ref()
            .and_then(Value::as_array)
            .is_some_and(|values| values.iter().any(|v| v.as_str() == Some(option)))
    }
}

/// Element type variants with type-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementType {
    /// Single-line text input.
    Textfield {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },

    /// Multi-line text input.
    Textarea { rows: u32 },

    /// Multiple checkboxes, submitted as a repeated `name[]` field.
    Checkboxes { options: Vec<(String, String)> },

    /// Hidden field.
    Hidden,

    /// Password field.
    Password,

    /// Submit button.
    Submit { value: String },

    /// Fieldset/group.
    Fieldset,

    /// Display-only markup.
    Markup { value: String },
}

impl ElementType {
    /// Get the type name as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementType::Textfield { .. } => "textfield",
            ElementType::Textarea { .. } => "textarea",
            ElementType::Checkboxes { .. } => "checkboxes",
            ElementType::Hidden => "hidden",
            ElementType::Password => "password",
            ElementType::Submit { .. } => "submit",
            ElementType::Fieldset => "fieldset",
            ElementType::Markup { .. } => "markup",
        }
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_builder() {
        let form = Form::new("test_form")
            .title("Test Form")
            .action("/submit")
            .element("name", FormElement::textfield().title("Name").required())
            .element("submit", FormElement::submit("Save").weight(100));

        assert_eq!(form.form_id, "test_form");
        assert_eq!(form.action, "/submit");
        assert_eq!(form.method, "post");
        assert_eq!(form.elements.len(), 2);
        assert!(form.elements.get("name").unwrap().required);
    }

    #[test]
    fn test_form_sorted_elements() {
        let form = Form::new("test")
            .element("c", FormElement::textfield().weight(30))
            .element("a", FormElement::textfield().weight(10))
            .element("b", FormElement::textfield().weight(20));

        let sorted = form.sorted_elements();
        assert_eq!(sorted[0].0, "a");
        assert_eq!(sorted[1].0, "b");
        assert_eq!(sorted[2].0, "c");
    }

    #[test]
    fn test_checkboxes_checked_state() {
        let element = FormElement::checkboxes(vec![
            ("article".to_string(), "Article".to_string()),
            ("page".to_string(), "Page".to_string()),
        ])
        .default_value(serde_json::json!(["page"]));

        assert!(element.is_checked("page"));
        assert!(!element.is_checked("article"));
        assert!(!FormElement::checkboxes(vec![]).is_checked("page"));
    }

    #[test]
    fn test_hidden_default_str() {
        let element = FormElement::hidden("abc123");
        assert_eq!(element.default_str(), "abc123");
        assert_eq!(FormElement::textarea(3).default_str(), "");
    }

    #[test]
    fn test_element_type_name() {
        assert_eq!(
            ElementType::Textfield { max_length: None }.type_name(),
            "textfield"
        );
        assert_eq!(ElementType::Textarea { rows: 10 }.type_name(), "textarea");
        assert_eq!(
            ElementType::Submit {
                value: "Save".to_string()
            }
            .type_name(),
            "submit"
        );
    }

    #[test]
    fn test_form_serialization() {
        let form = Form::new("test").element(
            "css",
            FormElement::textarea(10).attr("style", "width: 100%;"),
        );

        let json = serde_json::to_string(&form).unwrap();
        assert!(json.contains("textarea"));
        assert!(json.contains("width: 100%;"));

        let parsed: Form = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.form_id, "test");
        assert!(matches!(
            parsed.elements["css"].element_type,
            ElementType::Textarea { rows: 10 }
        ));
    }
}
