//! Admin routes: the dashboard and plugin settings pages.
//!
//! Settings pages are declared by plugins through `tap_menu`; the form comes
//! from `tap_settings_form` and submissions are stored generically for the
//! fields the plugin declared in `tap_settings_info`.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use vetrina_sdk::host::Host;
use vetrina_sdk::types::MenuDefinition;

use crate::error::{AppError, AppResult};
use crate::menu::CONFIG_PARENT;
use crate::models::SiteConfig;
use crate::settings::values_from_submission;
use crate::state::AppState;
use crate::tap::RequestState;
use crate::theme::TOKEN_FIELD;

use super::helpers::{ACCESS_DENIED, render_page, require_login, submitted};

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route(
            "/admin/config/{page}",
            get(settings_page).post(settings_submit),
        )
}

/// Token action guarding a settings group's form.
fn settings_action(group: &str) -> String {
    format!("settings:{group}")
}

/// Admin dashboard listing the configuration pages the user may open.
async fn dashboard(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    if let Err(redirect) = require_login(&state, &session).await {
        return Ok(redirect);
    }
    let request = state.request_state(&session).await;

    let pages: Vec<&MenuDefinition> = state
        .menu_registry()
        .children_of(CONFIG_PARENT)
        .into_iter()
        .filter(|m| request.user.has_permission(&m.permission))
        .collect();

    let mut context = tera::Context::new();
    context.insert("pages", &pages);
    let content = state.theme().render("admin/dashboard.html", &context)?;

    Ok(render_page(&state, &request, "/admin", "Administration", "", &content)
        .await?
        .into_response())
}

#[derive(Debug, Deserialize)]
struct SettingsQuery {
    saved: Option<String>,
}

/// Resolve a settings page and check the user may open it.
fn settings_menu<'a>(
    state: &'a AppState,
    request: &RequestState,
    page: &str,
) -> AppResult<&'a MenuDefinition> {
    let menu = state
        .menu_registry()
        .config_page(page)
        .ok_or(AppError::NotFound)?;
    if !request.user.has_permission(&menu.permission) {
        return Err(AppError::Forbidden(ACCESS_DENIED.to_string()));
    }
    Ok(menu)
}

/// A plugin settings page.
async fn settings_page(
    State(state): State<AppState>,
    session: Session,
    Path(page): Path<String>,
    Query(query): Query<SettingsQuery>,
) -> AppResult<Html<String>> {
    let request = state.request_state(&session).await;
    let menu = settings_menu(&state, &request, &page)?;

    let mut form = state
        .tap_dispatcher()
        .settings_form(&request, &menu.callback)
        .await?
        .ok_or(AppError::NotFound)?;
    if form.action.is_empty() {
        form.action = menu.path.clone();
    }
    form.token = request.issue_token(&settings_action(&menu.callback)).await?;

    let mut context = tera::Context::new();
    context.insert("heading", menu.heading());
    context.insert("form", &state.theme().render_form(&form)?);
    context.insert("saved", &query.saved.is_some());
    let content = state.theme().render("admin/settings.html", &context)?;

    render_page(&state, &request, &menu.path, menu.heading(), "", &content).await
}

/// Store a settings submission for the group behind the page.
async fn settings_submit(
    State(state): State<AppState>,
    session: Session,
    Path(page): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let request = state.request_state(&session).await;
    let menu = settings_menu(&state, &request, &page)?;
    let group = menu.callback.as_str();

    let token = submitted(&pairs, TOKEN_FIELD).unwrap_or_default();
    if !request.verify_token(&settings_action(group), token).await? {
        return Err(AppError::BadRequest(
            "Invalid form token. Please try again.".to_string(),
        ));
    }

    let definitions = state.settings_registry().group(group);
    for (name, value) in values_from_submission(definitions, &pairs) {
        SiteConfig::set(state.db(), &name, value).await?;
    }
    info!(group = %group, fields = definitions.len(), "settings saved");

    Ok(Redirect::to(&format!("{}?saved=1", menu.path)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_action_is_scoped_to_group() {
        assert_eq!(settings_action("custom_css"), "settings:custom_css");
        assert_ne!(settings_action("a"), settings_action("b"));
    }
}
