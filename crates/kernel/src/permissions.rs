//! Permission lookup with DashMap-based caching.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Role;
use crate::models::User;
use crate::models::role::well_known;
use crate::models::user::ANONYMOUS_USER_ID;

/// The administrative capability. Holders pass every permission check.
pub const ADMINISTER_SITE: &str = "administer site";
/// Edit any item.
pub const EDIT_ANY_CONTENT: &str = "edit any content";
/// Edit items the user authored.
pub const EDIT_OWN_CONTENT: &str = "edit own content";
/// Create items.
pub const CREATE_CONTENT: &str = "create content";
/// View published items.
pub const ACCESS_CONTENT: &str = "access content";

/// Permission service with fast DashMap-based lookups.
#[derive(Clone)]
pub struct PermissionService {
    inner: Arc<PermissionServiceInner>,
}

struct PermissionServiceInner {
    /// Cache of user_id -> permissions (nil id for anonymous).
    user_cache: DashMap<Uuid, HashSet<String>>,

    /// Database pool for cache misses.
    pool: PgPool,
}

impl PermissionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(PermissionServiceInner {
                user_cache: DashMap::new(),
                pool,
            }),
        }
    }

    /// Permissions held by an authenticated user: their roles plus the
    /// authenticated role.
    pub async fn user_permissions(&self, user: &User) -> Result<HashSet<String>> {
        if let Some(cached) = self.inner.user_cache.get(&user.id) {
            return Ok(cached.clone());
        }

        let mut permissions: HashSet<String> =
            Role::get_user_permissions(&self.inner.pool, user.id)
                .await?
                .into_iter()
                .collect();
        permissions.extend(
            Role::get_permissions(&self.inner.pool, well_known::AUTHENTICATED_ROLE_ID).await?,
        );
        if user.is_admin {
            permissions.insert(ADMINISTER_SITE.to_string());
        }

        self.inner.user_cache.insert(user.id, permissions.clone());
        Ok(permissions)
    }

    /// Permissions of the anonymous role.
    pub async fn anonymous_permissions(&self) -> Result<HashSet<String>> {
        if let Some(cached) = self.inner.user_cache.get(&ANONYMOUS_USER_ID) {
            return Ok(cached.clone());
        }

        let permissions: HashSet<String> =
            Role::get_permissions(&self.inner.pool, well_known::ANONYMOUS_ROLE_ID)
                .await?
                .into_iter()
                .collect();

        self.inner
            .user_cache
            .insert(ANONYMOUS_USER_ID, permissions.clone());
        Ok(permissions)
    }

    /// Invalidate the cache for a specific user.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.inner.user_cache.remove(&user_id);
    }

    /// Get the number of cached entries (for monitoring).
    pub fn cache_size(&self) -> usize {
        self.inner.user_cache.len()
    }
}
