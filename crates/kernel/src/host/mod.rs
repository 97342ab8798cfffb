//! Kernel services for plugins.
//!
//! `RequestState` implements the SDK's `Host` trait: configuration values,
//! per-item attributes, content types, session-scoped anti-forgery tokens,
//! the current user's permissions, and logging into `tracing`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vetrina_sdk::host::{Host, HostError, HostResult};
use vetrina_sdk::types::{ContentTypeInfo, Item, LogLevel};

use crate::form::csrf;
use crate::models::{ItemMeta, SiteConfig};
use crate::tap::{RequestServices, RequestState};

impl RequestState {
    fn require_services(&self) -> HostResult<&RequestServices> {
        self.services().ok_or(HostError::Unavailable("database"))
    }

    fn require_session(&self) -> HostResult<&tower_sessions::Session> {
        self.session().ok_or(HostError::Unavailable("session"))
    }
}

fn storage(e: anyhow::Error) -> HostError {
    HostError::Storage(format!("{e:#}"))
}

fn session(e: anyhow::Error) -> HostError {
    HostError::Session(format!("{e:#}"))
}

#[async_trait]
impl Host for RequestState {
    async fn variable_get(&self, name: &str) -> HostResult<Option<Value>> {
        let services = self.require_services()?;
        SiteConfig::get(&services.db, name).await.map_err(storage)
    }

    async fn item_meta_get(&self, item_id: Uuid, key: &str) -> HostResult<Option<String>> {
        let services = self.require_services()?;
        ItemMeta::get(&services.db, item_id, key)
            .await
            .map_err(storage)
    }

    async fn item_meta_set(&self, item_id: Uuid, key: &str, value: &str) -> HostResult<()> {
        let services = self.require_services()?;
        ItemMeta::set(&services.db, item_id, key, value)
            .await
            .map_err(storage)
    }

    async fn public_content_types(&self) -> HostResult<Vec<ContentTypeInfo>> {
        Ok(self.require_services()?.content_types.public_types())
    }

    async fn issue_token(&self, action: &str) -> HostResult<String> {
        csrf::generate_csrf_token(self.require_session()?, action)
            .await
            .map_err(session)
    }

    async fn verify_token(&self, action: &str, token: &str) -> HostResult<bool> {
        csrf::verify_csrf_token(self.require_session()?, action, token)
            .await
            .map_err(session)
    }

    fn current_user_has_permission(&self, permission: &str) -> bool {
        self.user.has_permission(permission)
    }

    fn current_user_can_edit(&self, item: &Item) -> bool {
        self.user.can_edit(item)
    }

    fn log(&self, level: LogLevel, plugin: &str, message: &str) {
        match level {
            LogLevel::Debug => debug!(plugin = %plugin, "{}", message),
            LogLevel::Info => info!(plugin = %plugin, "{}", message),
            LogLevel::Warning => warn!(plugin = %plugin, "{}", message),
            LogLevel::Error => error!(plugin = %plugin, "{}", message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::tap::UserContext;

    #[tokio::test]
    async fn storage_requires_services() {
        let state = RequestState::default();
        let err = state.variable_get("x").await.unwrap_err();
        assert!(matches!(err, HostError::Unavailable("database")));
    }

    #[tokio::test]
    async fn tokens_require_session() {
        let state = RequestState::default();
        assert!(matches!(
            state.issue_token("a").await.unwrap_err(),
            HostError::Unavailable("session")
        ));
    }

    #[tokio::test]
    async fn tokens_round_trip_through_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let state = RequestState::default().with_session(session);

        let token = state.issue_token("panel").await.unwrap();
        assert!(!state.verify_token("other", &token).await.unwrap());
        assert!(state.verify_token("panel", &token).await.unwrap());
        assert!(!state.verify_token("panel", &token).await.unwrap());
    }

    #[test]
    fn permissions_come_from_user_context() {
        let perms: HashSet<String> = ["administer site".to_string()].into();
        let state =
            RequestState::without_services(UserContext::authenticated(Uuid::now_v7(), "a", perms));
        assert!(state.current_user_has_permission("administer site"));
        assert!(!RequestState::default().current_user_has_permission("administer site"));
    }
}
