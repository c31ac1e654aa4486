//! Application configuration loaded from environment variables.

use std::str::FromStr;

/// Signing secret used when `JWT_SECRET` is unset. Only fit for local runs.
pub const DEV_JWT_SECRET: &str = "dev-only-insecure-jwt-secret";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `DB_MAX_CONNECTIONS` — pool size (default: `5`)
/// - `JWT_SECRET` — token signing secret (default: a development secret)
/// - `TOKEN_TTL_HOURS` — session token lifetime (default: `24`)
/// - `ADMIN_USERNAME`, `ADMIN_PASSWORD` — administrator created at startup
///   when both are set; `ADMIN_EMAIL` defaults to `<username>@localhost`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub admin: Option<AdminAccount>,
}

/// Credentials of the administrator account seeded at startup.
#[derive(Clone)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.jwt_secret),
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours),
            admin: admin_from_env(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            database_url: None,
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            admin: None,
        }
    }
}

fn admin_from_env() -> Option<AdminAccount> {
    let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    let username = var("ADMIN_USERNAME")?;
    let password = var("ADMIN_PASSWORD")?;
    let email = var("ADMIN_EMAIL").unwrap_or_else(|| format!("{username}@localhost"));
    Some(AdminAccount {
        username,
        email,
        password,
    })
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.token_ttl_hours, 24);
        assert!(config.uses_dev_secret());
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_custom_secret_is_not_dev() {
        let config = Config {
            jwt_secret: "production-secret".to_string(),
            ..Config::default()
        };
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_admin_debug_hides_password() {
        let admin = AdminAccount {
            username: "root".to_string(),
            email: "root@localhost".to_string(),
            password: "hunter2-hunter2".to_string(),
        };
        let printed = format!("{admin:?}");
        assert!(printed.contains("root@localhost"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_parse_or_falls_back_on_missing_key() {
        assert_eq!(parse_or("SHOP_CONFIG_TEST_UNSET_KEY", 42u32), 42);
    }
}
