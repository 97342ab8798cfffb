//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Redis connection URL.
    pub redis_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Path to the Tera templates directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Whether session cookies are marked `Secure` (default: true).
    pub cookie_secure: bool,

    /// Bootstrap admin account created at startup when both are set.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let templates_dir = lookup("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./templates"));

        let cookie_same_site = lookup("COOKIE_SAME_SITE")
            .unwrap_or_else(|| "strict".to_string())
            .to_lowercase();
        if !matches!(cookie_same_site.as_str(), "strict" | "lax" | "none") {
            bail!("COOKIE_SAME_SITE must be one of strict, lax, none (got {cookie_same_site})");
        }

        let cookie_secure = match lookup("COOKIE_SECURE") {
            None => true,
            Some(v) => parse_bool(&v).context("COOKIE_SECURE must be true or false")?,
        };

        let admin_username = lookup("ADMIN_USERNAME").filter(|s| !s.trim().is_empty());
        let admin_password = lookup("ADMIN_PASSWORD").filter(|s| !s.is_empty());

        Ok(Self {
            port,
            database_url,
            redis_url,
            database_max_connections,
            templates_dir,
            cookie_same_site,
            cookie_secure,
            admin_username,
            admin_password,
        })
    }

    /// Bootstrap admin credentials, if both are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(name), Some(pass)) => Some((name.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/vetrina")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.templates_dir, PathBuf::from("./templates"));
        assert_eq!(config.cookie_same_site, "strict");
        assert!(config.cookie_secure);
        assert!(config.admin_credentials().is_none());
    }

    #[test]
    fn database_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn same_site_is_validated() {
        let ok = load(&[("DATABASE_URL", "postgres://x"), ("COOKIE_SAME_SITE", "Lax")]).unwrap();
        assert_eq!(ok.cookie_same_site, "lax");
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("COOKIE_SAME_SITE", "loose")]).is_err());
    }

    #[test]
    fn cookie_secure_parses_booleans() {
        let config = load(&[("DATABASE_URL", "postgres://x"), ("COOKIE_SECURE", "false")]).unwrap();
        assert!(!config.cookie_secure);
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("COOKIE_SECURE", "maybe")]).is_err());
    }

    #[test]
    fn admin_credentials_need_both_parts() {
        let only_name = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_USERNAME", "admin"),
        ])
        .unwrap();
        assert!(only_name.admin_credentials().is_none());

        let both = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(both.admin_credentials(), Some(("admin", "secret")));
    }
}
