//! Shared route helpers for page rendering and form submissions.

use std::collections::HashMap;

use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::error::{AppError, AppResult};
use crate::menu::CONFIG_PARENT;
use crate::models::User;
use crate::state::AppState;
use crate::tap::RequestState;

/// Message shown when a page is refused for lack of permission.
pub const ACCESS_DENIED: &str = "You do not have sufficient permissions to access this page.";

/// Require an authenticated user, or redirect to login.
pub async fn require_login(state: &AppState, session: &Session) -> Result<User, Response> {
    match state.current_user(session).await {
        Some(user) => Ok(user),
        None => Err(Redirect::to("/user/login").into_response()),
    }
}

/// Require a permission of the request's user.
pub fn require_permission(request: &RequestState, permission: &str) -> AppResult<()> {
    if request.user.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(ACCESS_DENIED.to_string()))
    }
}

/// Inject site-wide context variables into a Tera context.
///
/// Adds: `site_name`, `user_authenticated`, `user_name`, `admin_links`
pub async fn inject_site_context(
    state: &AppState,
    request: &RequestState,
    context: &mut tera::Context,
) {
    context.insert("site_name", &state.site_name().await);
    context.insert("user_authenticated", &request.user.authenticated);
    context.insert("user_name", &request.user.name);

    let admin_links: Vec<_> = state
        .menu_registry()
        .children_of(CONFIG_PARENT)
        .into_iter()
        .filter(|m| request.user.has_permission(&m.permission))
        .collect();
    context.insert("admin_links", &admin_links);
}

/// Render `content` inside the page template chosen for `path`.
pub async fn render_page(
    state: &AppState,
    request: &RequestState,
    path: &str,
    title: &str,
    head: &str,
    content: &str,
) -> AppResult<Html<String>> {
    let mut context = tera::Context::new();
    inject_site_context(state, request, &mut context).await;

    let html = state
        .theme()
        .render_page(path, title, head, content, &mut context)?;
    Ok(Html(html))
}

/// Last submitted value for each field name.
pub fn submitted_values(pairs: &[(String, String)]) -> HashMap<String, String> {
    pairs.iter().cloned().collect()
}

/// Last submitted value of one field.
pub fn submitted<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use uuid::Uuid;

    use super::*;
    use crate::tap::UserContext;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn last_value_wins() {
        let p = pairs(&[("title", "a"), ("title", "b"), ("body", "x")]);
        assert_eq!(submitted(&p, "title"), Some("b"));
        assert_eq!(submitted(&p, "missing"), None);

        let values = submitted_values(&p);
        assert_eq!(values.get("title").map(String::as_str), Some("b"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn permission_check_maps_to_forbidden() {
        let anon = RequestState::without_services(UserContext::anonymous());
        let err = require_permission(&anon, "administer site").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == ACCESS_DENIED));

        let perms: HashSet<String> = ["administer site".to_string()].into();
        let admin = RequestState::without_services(UserContext::authenticated(
            Uuid::now_v7(),
            "admin",
            perms,
        ));
        assert!(require_permission(&admin, "anything").is_ok());
    }
}
