//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::Serialize;
use tera::Tera;
use tracing::debug;
use vetrina_sdk::form::{ElementType, Form, FormElement};
use vetrina_sdk::sanitize::{escape_attr, escape_html, escape_style_content};
use vetrina_sdk::types::{EditPanel, HeadElement};

/// Hidden field carrying the host-issued form token.
pub const TOKEN_FIELD: &str = "_token";

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

/// One checkbox of a `checkboxes` element, as seen by templates.
#[derive(Debug, Serialize)]
struct CheckboxOption<'a> {
    value: &'a str,
    label: &'a str,
    checked: bool,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        let engine = Self::from_tera(tera);

        debug!(
            count = engine.tera.get_template_names().count(),
            "loaded templates"
        );
        Ok(engine)
    }

    /// Create a theme engine from in-memory templates (for testing).
    pub fn from_templates<'a>(
        templates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .context("failed to parse templates")?;
        Ok(Self::from_tera(tera))
    }

    /// Create a theme engine with no templates (for testing).
    pub fn empty() -> Self {
        Self::from_tera(Tera::default())
    }

    fn from_tera(mut tera: Tera) -> Self {
        // Templates escape explicitly with esc_html / esc_attr
        tera.autoescape_on(vec![]);
        Self::register_filters(&mut tera);
        Self {
            tera,
            suggestion_cache: DashMap::new(),
        }
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        tera.register_filter(
            "esc_html",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                Ok(tera::Value::String(escape_html(&filter_text(value))))
            },
        );

        tera.register_filter(
            "esc_attr",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                Ok(tera::Value::String(escape_attr(&filter_text(value))))
            },
        );

        // Filter for formatting Unix timestamps as human-readable dates
        tera.register_filter(
            "format_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let timestamp = match value {
                    tera::Value::Number(n) => n.as_i64().unwrap_or(0),
                    _ => return Ok(tera::Value::String(String::new())),
                };

                let formatted = chrono::DateTime::from_timestamp(timestamp, 0)
                    .map(|dt| dt.format("%B %-d, %Y").to_string())
                    .unwrap_or_else(|| "Unknown date".to_string());

                Ok(tera::Value::String(formatted))
            },
        );
    }

    /// Get the underlying Tera instance for custom operations.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached for performance.
    ///
    /// Example suggestions: `["page--admin--config", "page--admin", "page"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }

            if self.tera.get_template(suggestion).is_ok() {
                let name = (*suggestion).to_string();
                self.suggestion_cache.insert(cache_key, name.clone());
                return Some(name);
            }
        }

        // Negative results are not cached
        None
    }

    /// Render a named template.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String> {
        self.tera
            .render(template, context)
            .with_context(|| format!("failed to render template: {template}"))
    }

    /// Render the elements plugins contributed to the page `<head>`.
    ///
    /// Style blocks are emitted verbatim apart from neutralising `</`, so a
    /// stored value can never close the element early.
    pub fn render_head(elements: &[HeadElement]) -> String {
        let mut html = String::new();
        for element in elements {
            match element {
                HeadElement::Style { css } => {
                    let _ = write!(
                        html,
                        "<style type=\"text/css\">{}</style>",
                        escape_style_content(css)
                    );
                }
            }
        }
        html
    }

    /// Render a form to HTML.
    pub fn render_form(&self, form: &Form) -> Result<String> {
        let mut elements_html = String::new();
        for (name, element) in form.sorted_elements() {
            elements_html.push_str(&self.render_form_element(name, element)?);
        }

        let mut context = tera::Context::new();
        context.insert("form", form);
        context.insert("elements", &elements_html);
        context.insert("token_field", TOKEN_FIELD);

        let specific = format!("form/form--{}", form.form_id);
        let template = self
            .resolve_template(&[specific.as_str(), "form/form"])
            .unwrap_or_else(|| "form/form.html".to_string());
        self.render(&template, &context)
    }

    /// The form element for an editing-surface panel. The panel title
    /// labels the element unless it carries its own, and the panel id
    /// becomes its `id` attribute.
    pub fn panel_element(panel: &EditPanel) -> FormElement {
        let mut element = panel.element.clone();
        if element.title.is_none() {
            element.title = Some(panel.title.clone());
        }
        element
            .attributes
            .entry("id".to_string())
            .or_insert_with(|| panel.id.clone());
        element
    }

    /// Render a single form element (and its children) to HTML.
    pub fn render_form_element(&self, name: &str, element: &FormElement) -> Result<String> {
        let type_name = element.element_type.type_name();

        let mut context = tera::Context::new();
        context.insert("name", name);
        context.insert("element", element);
        context.insert("value", element.default_str());

        if let ElementType::Checkboxes { options } = &element.element_type {
            let options: Vec<CheckboxOption<'_>> = options
                .iter()
                .map(|(value, label)| CheckboxOption {
                    value,
                    label,
                    checked: element.is_checked(value),
                })
                .collect();
            context.insert("options", &options);
        }

        if !element.children.is_empty() {
            let mut children: Vec<_> = element.children.iter().collect();
            children.sort_by_key(|(_, child)| child.weight);

            let mut children_html = String::new();
            for (child_name, child) in children {
                children_html.push_str(&self.render_form_element(child_name, child)?);
            }
            context.insert("children", &children_html);
        }

        let specific = format!("form/{type_name}--{name}");
        let generic = format!("form/{type_name}");
        let template = self
            .resolve_template(&[specific.as_str(), generic.as_str()])
            .with_context(|| format!("no template for form element type: {type_name}"))?;
        self.render(&template, &context)
            .with_context(|| format!("failed to render form element: {name}"))
    }

    /// Check if a path is an admin path.
    ///
    /// Admin paths use a different template set (page--admin.html vs page.html).
    pub fn is_admin_path(path: &str) -> bool {
        path == "/admin" || path.starts_with("/admin/")
    }

    /// Get page template suggestions based on path.
    pub fn page_suggestions(path: &str) -> Vec<String> {
        let mut suggestions = Vec::new();

        // /admin/config/custom-css -> page--admin--config--custom-css
        let normalized = path.trim_matches('/').replace('/', "--");
        if !normalized.is_empty() {
            suggestions.push(format!("page--{normalized}"));
        }

        if Self::is_admin_path(path) && normalized != "admin" {
            suggestions.push("page--admin".to_string());
        }

        suggestions.push("page".to_string());
        suggestions
    }

    /// Render a full page around already-rendered content.
    ///
    /// `head` is the output of [`ThemeEngine::render_head`].
    pub fn render_page(
        &self,
        path: &str,
        title: &str,
        head: &str,
        content: &str,
        context: &mut tera::Context,
    ) -> Result<String> {
        let suggestions = Self::page_suggestions(path);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(String::as_str).collect();

        let template = self
            .resolve_template(&suggestion_refs)
            .unwrap_or_else(|| "page.html".to_string());

        context.insert("title", title);
        context.insert("head", head);
        context.insert("content", content);
        context.insert("path", path);
        context.insert("is_admin_path", &Self::is_admin_path(path));

        self.render(&template, context)
            .context("failed to render page template")
    }
}

/// Text of a filter argument: strings as-is, null as empty, anything else
/// via its JSON form.
fn filter_text(value: &tera::Value) -> String {
    match value {
        tera::Value::String(s) => s.clone(),
        tera::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use vetrina_sdk::types::PanelPriority;

    use super::*;

    fn form_templates() -> ThemeEngine {
        ThemeEngine::from_templates([
            (
                "form/form.html",
                "<form action=\"{{ form.action | esc_attr }}\">{{ elements }}<input type=\"hidden\" name=\"{{ token_field }}\" value=\"{{ form.token | esc_attr }}\"></form>",
            ),
            (
                "form/textarea.html",
                "<textarea name=\"{{ name | esc_attr }}\">{{ value | esc_html }}</textarea>",
            ),
            (
                "form/hidden.html",
                "<input type=\"hidden\" name=\"{{ name | esc_attr }}\" value=\"{{ value | esc_attr }}\">",
            ),
            (
                "form/checkboxes.html",
                "{% for opt in options %}<input type=\"checkbox\" name=\"{{ name }}[]\" value=\"{{ opt.value }}\"{% if opt.checked %} checked{% endif %}>{% endfor %}",
            ),
            (
                "form/submit.html",
                "<input type=\"submit\" value=\"{{ element.value | esc_attr }}\">",
            ),
            (
                "form/fieldset.html",
                "<fieldset id=\"{{ element.attributes.id | default(value=name) }}\"><legend>{{ element.title | esc_html }}</legend>{{ children }}</fieldset>",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_is_admin_path() {
        assert!(ThemeEngine::is_admin_path("/admin"));
        assert!(ThemeEngine::is_admin_path("/admin/config/custom-css"));
        assert!(!ThemeEngine::is_admin_path("/administrator"));
        assert!(!ThemeEngine::is_admin_path("/item/123"));
        assert!(!ThemeEngine::is_admin_path("/"));
    }

    #[test]
    fn test_page_suggestions() {
        let suggestions = ThemeEngine::page_suggestions("/admin/config/custom-css");
        assert_eq!(
            suggestions,
            vec!["page--admin--config--custom-css", "page--admin", "page"]
        );

        assert_eq!(
            ThemeEngine::page_suggestions("/admin"),
            vec!["page--admin", "page"]
        );
        assert_eq!(ThemeEngine::page_suggestions("/"), vec!["page"]);
    }

    #[test]
    fn head_style_block_is_exact() {
        let html = ThemeEngine::render_head(&[HeadElement::style("body{color:red}")]);
        assert_eq!(html, "<style type=\"text/css\">body{color:red}</style>");
    }

    #[test]
    fn head_style_cannot_close_early() {
        let html = ThemeEngine::render_head(&[HeadElement::style("a{}</style><script>")]);
        assert_eq!(
            html,
            "<style type=\"text/css\">a{}<\\/style><script></style>"
        );
    }

    #[test]
    fn empty_head_renders_nothing() {
        assert_eq!(ThemeEngine::render_head(&[]), "");
    }

    #[test]
    fn resolve_template_prefers_specific() {
        let engine =
            ThemeEngine::from_templates([("page.html", "base"), ("page--admin.html", "admin")])
                .unwrap();
        assert_eq!(
            engine.resolve_template(&["page--admin--config", "page--admin", "page"]),
            Some("page--admin.html".to_string())
        );
        assert_eq!(
            engine.resolve_template(&["page--item", "page"]),
            Some("page.html".to_string())
        );
        assert_eq!(engine.resolve_template(&["missing"]), None);
        assert_eq!(engine.resolve_template(&[]), None);
    }

    #[test]
    fn render_page_uses_admin_template() {
        let engine = ThemeEngine::from_templates([
            ("page.html", "front:{{ title }}"),
            ("page--admin.html", "admin:{{ title }}:{{ content }}"),
        ])
        .unwrap();

        let out = engine
            .render_page("/admin/config/x", "Settings", "", "<p>hi</p>", &mut tera::Context::new())
            .unwrap();
        assert_eq!(out, "admin:Settings:<p>hi</p>");

        let out = engine
            .render_page("/", "Home", "", "", &mut tera::Context::new())
            .unwrap();
        assert_eq!(out, "front:Home");
    }

    #[test]
    fn esc_filters_escape() {
        let engine = ThemeEngine::from_templates([(
            "t.html",
            "{{ v | esc_html }}|{{ v | esc_attr }}|{{ n | esc_html }}|{{ missing | default(value='') | esc_html }}",
        )])
        .unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("v", "<a href='x'>&</a>");
        ctx.insert("n", &42);
        let out = engine.render("t.html", &ctx).unwrap();
        assert_eq!(
            out,
            "&lt;a href=&#x27;x&#x27;&gt;&amp;&lt;/a&gt;|&lt;a href=&#x27;x&#x27;&gt;&amp;&lt;/a&gt;|42|"
        );
    }

    #[test]
    fn form_renders_sorted_elements_and_token() {
        let engine = form_templates();
        let mut form = Form::new("settings")
            .action("/admin/config/x")
            .element(
                "post_types",
                FormElement::checkboxes(vec![
                    ("article".into(), "Article".into()),
                    ("page".into(), "Basic page".into()),
                ])
                .default_value(serde_json::json!(["page"])),
            )
            .element("submit", FormElement::submit("Save Changes").weight(100));
        form.token = "tok-1".into();

        let html = engine.render_form(&form).unwrap();
        assert_eq!(
            html,
            "<form action=\"/admin/config/x\">\
             <input type=\"checkbox\" name=\"post_types[]\" value=\"article\">\
             <input type=\"checkbox\" name=\"post_types[]\" value=\"page\" checked>\
             <input type=\"submit\" value=\"Save Changes\">\
             <input type=\"hidden\" name=\"_token\" value=\"tok-1\"></form>"
        );
    }

    #[test]
    fn panel_renders_children_with_escaped_values() {
        let engine = form_templates();
        let panel = EditPanel::new(
            "css_panel",
            "Custom CSS",
            FormElement::fieldset()
                .child(
                    "custom_css",
                    FormElement::textarea(10).default_value("a{}</textarea>"),
                )
                .child("nonce", FormElement::hidden("n-1").weight(1)),
        )
        .priority(PanelPriority::High);

        let element = ThemeEngine::panel_element(&panel);
        let html = engine.render_form_element(&panel.id, &element).unwrap();
        assert_eq!(
            html,
            "<fieldset id=\"css_panel\"><legend>Custom CSS</legend>\
             <textarea name=\"custom_css\">a{}&lt;/textarea&gt;</textarea>\
             <input type=\"hidden\" name=\"nonce\" value=\"n-1\"></fieldset>"
        );
    }

    #[test]
    fn missing_element_template_is_an_error() {
        let engine = ThemeEngine::empty();
        let err = engine
            .render_form_element("x", &FormElement::password())
            .unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_format_date_filter_with_valid_timestamp() {
        let engine = ThemeEngine::from_templates([("test", "{{ ts | format_date }}")]).unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("ts", &1739577600_i64); // 2025-02-15 00:00:00 UTC
        assert_eq!(engine.render("test", &ctx).unwrap(), "February 15, 2025");
    }

    #[test]
    fn test_format_date_filter_with_string() {
        let engine = ThemeEngine::from_templates([("test", "{{ ts | format_date }}")]).unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("ts", "not a number");
        assert_eq!(engine.render("test", &ctx).unwrap(), "");
    }
}
