//! Per-request state handed to plugin taps.
//!
//! Each request builds a `RequestState` from the session's user and the
//! shared services. It implements the SDK's `Host` trait (see `crate::host`),
//! so plugins reach kernel services only through it.

use std::collections::HashSet;

use sqlx::PgPool;
use tower_sessions::Session;
use uuid::Uuid;
use vetrina_sdk::types::Item;

use crate::content::ContentTypeRegistry;
use crate::permissions::{ADMINISTER_SITE, EDIT_ANY_CONTENT, EDIT_OWN_CONTENT};

/// User context for the current request.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// User ID (Uuid::nil() for anonymous).
    pub id: Uuid,
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Display name (empty for anonymous).
    pub name: String,
    /// Cached permissions for the user.
    pub permissions: HashSet<String>,
}

impl UserContext {
    /// Create context for anonymous user.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            authenticated: false,
            name: String::new(),
            permissions: HashSet::new(),
        }
    }

    /// Anonymous user holding the anonymous role's permissions.
    pub fn anonymous_with(permissions: HashSet<String>) -> Self {
        Self {
            permissions,
            ..Self::anonymous()
        }
    }

    /// Create context for authenticated user.
    pub fn authenticated(id: Uuid, name: impl Into<String>, permissions: HashSet<String>) -> Self {
        Self {
            id,
            authenticated: true,
            name: name.into(),
            permissions,
        }
    }

    /// Check if user has a specific permission. Admins hold every permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.contains(permission)
    }

    /// Check if user is admin.
    pub fn is_admin(&self) -> bool {
        self.permissions.contains(ADMINISTER_SITE)
    }

    /// Whether the user may edit this item.
    pub fn can_edit(&self, item: &Item) -> bool {
        self.has_permission(EDIT_ANY_CONTENT)
            || (self.authenticated
                && item.author_id == self.id
                && self.has_permission(EDIT_OWN_CONTENT))
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Services available to plugins during tap execution.
#[derive(Clone)]
pub struct RequestServices {
    /// Database connection pool.
    pub db: PgPool,
    /// Known content types.
    pub content_types: ContentTypeRegistry,
}

impl std::fmt::Debug for RequestServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestServices")
            .field("db", &"PgPool")
            .field("content_types", &self.content_types.len())
            .finish()
    }
}

/// Per-request state passed to taps.
#[derive(Debug, Clone)]
pub struct RequestState {
    /// User context for this request.
    pub user: UserContext,
    services: Option<RequestServices>,
    session: Option<Session>,
}

impl RequestState {
    /// Create a new request state with user context, services and session.
    pub fn new(user: UserContext, services: RequestServices, session: Session) -> Self {
        Self {
            user,
            services: Some(services),
            session: Some(session),
        }
    }

    /// Create request state without services or session (for startup and
    /// testing).
    pub fn without_services(user: UserContext) -> Self {
        Self {
            user,
            services: None,
            session: None,
        }
    }

    /// Attach a session.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Get shared services (None in test mode or serviceless contexts).
    pub fn services(&self) -> Option<&RequestServices> {
        self.services.as_ref()
    }

    /// Get the request session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::without_services(UserContext::anonymous())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn perms(list: &[&str]) -> HashSet<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    fn item_by(author_id: Uuid) -> Item {
        Item {
            id: Uuid::now_v7(),
            item_type: "page".into(),
            title: "About".into(),
            status: 1,
            author_id,
            created: 0,
            changed: 0,
        }
    }

    #[test]
    fn anonymous_user_context() {
        let ctx = UserContext::anonymous();
        assert_eq!(ctx.id, Uuid::nil());
        assert!(!ctx.authenticated);
        assert!(ctx.permissions.is_empty());
        assert!(!ctx.has_permission("administer site"));
    }

    #[test]
    fn admin_holds_every_permission() {
        let ctx = UserContext::authenticated(Uuid::now_v7(), "admin", perms(&["administer site"]));
        assert!(ctx.is_admin());
        assert!(ctx.has_permission("edit any content"));
        assert!(ctx.can_edit(&item_by(Uuid::now_v7())));
    }

    #[test]
    fn edit_own_requires_authorship() {
        let id = Uuid::now_v7();
        let ctx = UserContext::authenticated(id, "writer", perms(&["edit own content"]));

        assert!(ctx.can_edit(&item_by(id)));
        assert!(!ctx.can_edit(&item_by(Uuid::now_v7())));
    }

    #[test]
    fn anonymous_cannot_edit_nil_authored_items() {
        let ctx = UserContext::anonymous_with(perms(&["edit own content"]));
        assert!(!ctx.can_edit(&item_by(Uuid::nil())));
    }

    #[test]
    fn request_state_default() {
        let state = RequestState::default();
        assert_eq!(state.user.id, Uuid::nil());
        assert!(state.services().is_none());
        assert!(state.session().is_none());
    }
}
