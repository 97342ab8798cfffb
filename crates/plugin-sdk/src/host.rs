//! Kernel services available to plugins during a tap.
//!
//! Every tap receives a `&dyn Host` scoped to the current request: the
//! current user, their session, and the site's persistent stores. Plugins
//! never touch the database or session directly.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ContentTypeInfo, Item, LogLevel};

/// Errors returned by host services.
#[derive(Debug, Error)]
pub enum HostError {
    /// The current user may not perform the operation.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A persistent store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The request session could not be read or written.
    #[error("session error: {0}")]
    Session(String),

    /// The service is not available in this context (e.g. background tasks).
    #[error("host service unavailable: {0}")]
    Unavailable(&'static str),
}

/// Result type alias using HostError.
pub type HostResult<T> = Result<T, HostError>;

/// Kernel services for plugins.
#[async_trait]
pub trait Host: Send + Sync {
    /// Read a site configuration value.
    async fn variable_get(&self, name: &str) -> HostResult<Option<Value>>;

    /// Read a per-item attribute.
    async fn item_meta_get(&self, item_id: Uuid, key: &str) -> HostResult<Option<String>>;

    /// Write a per-item attribute, replacing any previous value.
    async fn item_meta_set(&self, item_id: Uuid, key: &str, value: &str) -> HostResult<()>;

    /// List the publicly viewable content types, sorted by machine name.
    async fn public_content_types(&self) -> HostResult<Vec<ContentTypeInfo>>;

    /// Issue an anti-forgery token scoped to `action`.
    async fn issue_token(&self, action: &str) -> HostResult<String>;

    /// Verify (and consume) an anti-forgery token for `action`.
    async fn verify_token(&self, action: &str, token: &str) -> HostResult<bool>;

    /// Whether the current user holds a permission.
    fn current_user_has_permission(&self, permission: &str) -> bool;

    /// Whether the current user may edit this specific item.
    fn current_user_can_edit(&self, item: &Item) -> bool;

    /// Emit a log record attributed to `plugin`.
    fn log(&self, level: LogLevel, plugin: &str, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            HostError::AccessDenied("nope".into()).to_string(),
            "access denied: nope"
        );
        assert_eq!(
            HostError::Unavailable("session").to_string(),
            "host service unavailable: session"
        );
    }
}
