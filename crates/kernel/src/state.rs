//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;
use vetrina_sdk::plugin::Plugin;

use crate::config::Config;
use crate::content::{ContentTypeRegistry, ItemService};
use crate::db;
use crate::menu::MenuRegistry;
use crate::models::{CreateUser, SiteConfig, User};
use crate::permissions::PermissionService;
use crate::session::SESSION_USER_ID;
use crate::settings::SettingsRegistry;
use crate::tap::{RequestServices, RequestState, TapDispatcher, TapRegistry, UserContext};
use crate::theme::ThemeEngine;

/// Plugins compiled into the kernel, in registration order.
pub fn builtin_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(custom_css::CustomCss)]
}

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Permission service for access control.
    permissions: PermissionService,

    /// Tap dispatcher for invoking plugin taps.
    tap_dispatcher: TapDispatcher,

    /// Admin pages declared by plugins.
    menu_registry: MenuRegistry,

    /// Settings declared by plugins.
    settings_registry: SettingsRegistry,

    /// Content types loaded at startup.
    content_types: ContentTypeRegistry,

    /// Item service with tap integration.
    items: ItemService,

    /// Tera theme engine.
    theme: ThemeEngine,
}

impl AppState {
    /// Connect to the database, apply migrations and assemble the state.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        info!("connected to PostgreSQL");

        db::run_migrations(&pool).await?;
        info!("database migrations applied");

        if let Some((name, password)) = config.admin_credentials() {
            ensure_admin(&pool, name, password).await?;
        }

        let content_types = ContentTypeRegistry::load(&pool).await?;

        let theme = ThemeEngine::new(&config.templates_dir)
            .with_context(|| format!("failed to load templates from {:?}", config.templates_dir))?;

        Ok(Self::from_parts(pool, content_types, theme, builtin_plugins()))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        pool: PgPool,
        content_types: ContentTypeRegistry,
        theme: ThemeEngine,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Self {
        let registry = Arc::new(TapRegistry::from_plugins(plugins));
        let tap_dispatcher = TapDispatcher::new(registry);

        let menu_registry = MenuRegistry::from_menus(tap_dispatcher.menus());
        let settings_registry = SettingsRegistry::from_definitions(tap_dispatcher.settings());
        info!(menus = menu_registry.len(), "plugin menus registered");

        let items = ItemService::new(pool.clone(), tap_dispatcher.clone());

        Self {
            inner: Arc::new(AppStateInner {
                permissions: PermissionService::new(pool.clone()),
                db: pool,
                tap_dispatcher,
                menu_registry,
                settings_registry,
                content_types,
                items,
                theme,
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub fn permissions(&self) -> &PermissionService {
        &self.inner.permissions
    }

    pub fn tap_dispatcher(&self) -> &TapDispatcher {
        &self.inner.tap_dispatcher
    }

    pub fn menu_registry(&self) -> &MenuRegistry {
        &self.inner.menu_registry
    }

    pub fn settings_registry(&self) -> &SettingsRegistry {
        &self.inner.settings_registry
    }

    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.inner.content_types
    }

    pub fn items(&self) -> &ItemService {
        &self.inner.items
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    /// Services handed to plugins through the host.
    pub fn request_services(&self) -> RequestServices {
        RequestServices {
            db: self.inner.db.clone(),
            content_types: self.inner.content_types.clone(),
        }
    }

    /// The logged-in user, if the session names an existing active one.
    pub async fn current_user(&self, session: &Session) -> Option<User> {
        let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();
        let id = user_id?;

        match User::find_by_id(self.db(), id).await {
            Ok(Some(user)) if user.is_active() => Some(user),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, user_id = %id, "failed to load session user");
                None
            }
        }
    }

    /// Build the per-request state plugins see through the host.
    ///
    /// A failed permission lookup leaves the user with no permissions.
    pub async fn request_state(&self, session: &Session) -> RequestState {
        let user = match self.current_user(session).await {
            Some(user) => {
                let permissions = self
                    .permissions()
                    .user_permissions(&user)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, user_id = %user.id, "permission lookup failed");
                        Default::default()
                    });
                UserContext::authenticated(user.id, user.name, permissions)
            }
            None => {
                let permissions =
                    self.permissions()
                        .anonymous_permissions()
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "anonymous permission lookup failed");
                            Default::default()
                        });
                UserContext::anonymous_with(permissions)
            }
        };

        RequestState::new(user, self.request_services(), session.clone())
    }

    /// Site name for page chrome, falling back to the default on error.
    pub async fn site_name(&self) -> String {
        SiteConfig::site_name(self.db()).await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load site name");
            crate::models::site_config::DEFAULT_SITE_NAME.to_string()
        })
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}

/// Create the bootstrap admin account if no user has that name.
async fn ensure_admin(pool: &PgPool, name: &str, password: &str) -> Result<()> {
    if User::find_by_name(pool, name).await?.is_some() {
        return Ok(());
    }

    let user = User::create(
        pool,
        CreateUser {
            name: name.to_string(),
            password: password.to_string(),
            mail: String::new(),
            is_admin: true,
        },
    )
    .await?;
    info!(user_id = %user.id, name = %user.name, "bootstrap admin created");
    Ok(())
}
