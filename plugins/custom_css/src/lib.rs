//! Custom CSS plugin for Vetrina.
//!
//! Administrators pick which content types take per-item CSS. Editors of
//! those types get a "Custom CSS" panel on the editing surface, the value is
//! stored as the `_custom_css` item attribute on save, and it is written
//! into the `<head>` of the item's public page.

pub mod settings;

use vetrina_sdk::prelude::*;

pub use settings::CssSettings;

pub const PLUGIN_NAME: &str = "custom_css";

pub const SETTINGS_GROUP: &str = "custom_css_for_selective_content_group";
pub const POST_TYPES_OPTION: &str = "custom_css_for_selective_content_post_types";
/// Submitted as `post_types[]`.
pub const POST_TYPES_FIELD: &str = "post_types";

pub const ADMIN_PATH: &str = "/admin/config/custom-css";
pub const ADMIN_PERMISSION: &str = "administer site";

pub const META_KEY: &str = "_custom_css";
pub const CSS_FIELD: &str = "custom_css";
pub const NONCE_FIELD: &str = "custom_css_for_selective_content_nonce";
pub const NONCE_ACTION: &str = "custom_css_for_selective_content_nonce";
pub const PANEL_ID: &str = "custom_css_for_selective_content";

/// Runs after other head content.
pub const PAGE_HEAD_WEIGHT: i32 = 999;

const ACCESS_DENIED: &str = "You do not have sufficient permissions to access this page.";

/// The plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomCss;

impl CustomCss {
    fn skip(host: &dyn Host, reason: &str) -> HostResult<()> {
        host.log(
            LogLevel::Debug,
            PLUGIN_NAME,
            &format!("custom CSS not saved: {reason}"),
        );
        Ok(())
    }
}

#[async_trait]
impl Plugin for CustomCss {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn taps(&self) -> Vec<TapRegistration> {
        vec![
            TapRegistration::new(taps::MENU),
            TapRegistration::new(taps::SETTINGS_INFO),
            TapRegistration::new(taps::SETTINGS_FORM),
            TapRegistration::new(taps::ITEM_EDIT_PANELS),
            TapRegistration::new(taps::ITEM_SAVE),
            TapRegistration::new(taps::PAGE_HEAD).weight(PAGE_HEAD_WEIGHT),
        ]
    }

    fn tap_menu(&self) -> Vec<MenuDefinition> {
        vec![
            MenuDefinition::new(ADMIN_PATH, "Custom CSS")
                .page_title("Custom CSS for Selective Content")
                .callback(SETTINGS_GROUP)
                .permission(ADMIN_PERMISSION)
                .parent("/admin/config"),
        ]
    }

    fn tap_settings_info(&self) -> Vec<SettingDefinition> {
        vec![CssSettings::definition()]
    }

    async fn tap_settings_form(&self, host: &dyn Host, group: &str) -> HostResult<Option<Form>> {
        if group != SETTINGS_GROUP {
            return Ok(None);
        }
        if !host.current_user_has_permission(ADMIN_PERMISSION) {
            return Err(HostError::AccessDenied(ACCESS_DENIED.into()));
        }

        let settings = CssSettings::load(host).await?;
        let options = host
            .public_content_types()
            .await?
            .into_iter()
            .map(|t| (t.machine_name, t.label))
            .collect();
        let checked: Vec<_> = settings.post_types.iter().cloned().collect();

        let form = Form::new(SETTINGS_GROUP)
            .title("Custom CSS for Selective Content")
            .element(
                POST_TYPES_FIELD,
                FormElement::checkboxes(options)
                    .title("Enable Custom CSS for these content types")
                    .default_value(checked)
                    .weight(0),
            )
            .element("submit", FormElement::submit("Save Changes").weight(100));

        Ok(Some(form))
    }

    async fn tap_item_edit_panels(
        &self,
        host: &dyn Host,
        item: &Item,
    ) -> HostResult<Vec<EditPanel>> {
        let settings = CssSettings::load(host).await?;
        if !settings.is_enabled(&item.item_type) {
            return Ok(Vec::new());
        }

        let css = host
            .item_meta_get(item.id, META_KEY)
            .await?
            .unwrap_or_default();
        let token = host.issue_token(NONCE_ACTION).await?;

        let body = FormElement::fieldset()
            .child(
                CSS_FIELD,
                FormElement::textarea(10)
                    .default_value(css)
                    .attr("style", "width: 100%;"),
            )
            .child(NONCE_FIELD, FormElement::hidden(token));

        Ok(vec![
            EditPanel::new(PANEL_ID, "Custom CSS", body)
                .context(PanelContext::Normal)
                .priority(PanelPriority::High),
        ])
    }

    async fn tap_item_save(&self, host: &dyn Host, event: &SaveEvent) -> HostResult<()> {
        let Some(token) = event.get(NONCE_FIELD) else {
            return Self::skip(host, "no token submitted");
        };
        if !host.verify_token(NONCE_ACTION, token).await? {
            return Self::skip(host, "token verification failed");
        }
        if event.autosave {
            return Self::skip(host, "autosave");
        }
        if !host.current_user_can_edit(&event.item) {
            return Self::skip(host, "user may not edit this item");
        }
        let Some(css) = event.get(CSS_FIELD) else {
            return Self::skip(host, "no CSS field submitted");
        };

        let css = sanitize::sanitize_text_field(css);
        host.item_meta_set(event.item.id, META_KEY, &css).await
    }

    async fn tap_page_head(
        &self,
        host: &dyn Host,
        view: &PageView,
    ) -> HostResult<Vec<HeadElement>> {
        let Some(item) = view.item() else {
            return Ok(Vec::new());
        };

        match host.item_meta_get(item.id, META_KEY).await? {
            Some(css) if !css.is_empty() => Ok(vec![HeadElement::style(css)]),
            _ => Ok(Vec::new()),
        }
    }
}
