//! API server configuration.

use std::fmt;

use taskgate_core::auth::jwt::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, resolve_secret};
use taskgate_core::auth::password::DEFAULT_BCRYPT_COST;

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Signing secret for access tokens.
    pub access_token_secret: String,
    /// Signing secret for refresh tokens. Must differ from the access secret.
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// Front-end origin: base of the reset link and the allowed CORS origin.
    pub app_url: String,
    /// Whether the refresh cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    /// Mail relay endpoint. `None` logs deliveries instead of sending.
    pub mail_relay_url: Option<String>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("app_url", &self.app_url)
            .field("cookie_secure", &self.cookie_secure)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("mail_relay_url", &self.mail_relay_url)
            .finish_non_exhaustive()
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                                  |
    /// |--------------------------|------------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:3100`                         |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/taskgate`     |
    /// | `ACCESS_TOKEN_SECRET`    | generated & persisted to file            |
    /// | `REFRESH_TOKEN_SECRET`   | generated & persisted to file            |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `900`                                    |
    /// | `REFRESH_TOKEN_TTL_SECS` | `86400`                                  |
    /// | `APP_URL`                | `http://localhost:3000`                  |
    /// | `COOKIE_SECURE`          | `true`                                   |
    /// | `BCRYPT_COST`            | `12`                                     |
    /// | `MAIL_RELAY_URL`         | unset                                    |
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:3100"),
            database_url: env_or("DATABASE_URL", "postgres://localhost:5432/taskgate"),
            access_token_secret: resolve_secret("ACCESS_TOKEN_SECRET", "access-token-secret"),
            refresh_token_secret: resolve_secret("REFRESH_TOKEN_SECRET", "refresh-token-secret"),
            access_token_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", REFRESH_TOKEN_TTL_SECS),
            app_url: env_or("APP_URL", "http://localhost:3000"),
            cookie_secure: env_parse("COOKIE_SECURE", true),
            bcrypt_cost: env_parse("BCRYPT_COST", DEFAULT_BCRYPT_COST),
            mail_relay_url: std::env::var("MAIL_RELAY_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Fixed configuration for tests: distinct literal secrets, cheap bcrypt.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            access_token_secret: "test-access-secret".into(),
            refresh_token_secret: "test-refresh-secret".into(),
            access_token_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: REFRESH_TOKEN_TTL_SECS,
            app_url: "http://localhost:3000".into(),
            cookie_secure: true,
            bcrypt_cost: 4,
            mail_relay_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_secrets() {
        let rendered = format!("{:?}", ApiConfig::for_tests());
        assert!(!rendered.contains("test-access-secret"));
        assert!(!rendered.contains("test-refresh-secret"));
    }
}
