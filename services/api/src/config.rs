//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which [`SessionService`](book_catalog_core::SessionService) backs the auth handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionBackend {
    /// Sessions live in the `auth_sessions` table next to the catalog.
    Sqlite,
    /// Sessions live in process memory and vanish on restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Empty means "mirror the request origin".
    pub cors_allowed_origins: Vec<String>,
    pub session_backend: SessionBackend,
    pub session_ttl_days: i64,
    pub session_cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_url: "sqlite://catalog.db".to_string(),
            log_level: Level::INFO,
            cors_allowed_origins: Vec::new(),
            session_backend: SessionBackend::Sqlite,
            session_ttl_days: 30,
            session_cookie_secure: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        if database_url.trim().is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // --- Session Settings ---
        let session_backend = match lookup("SESSION_STORE").as_deref() {
            None => defaults.session_backend,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "sqlite" => SessionBackend::Sqlite,
                "memory" => SessionBackend::Memory,
                other => {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_STORE".to_string(),
                        format!("'{}' is not one of sqlite, memory", other),
                    ))
                }
            },
        };

        let session_ttl_days = match lookup("SESSION_TTL_DAYS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if days > 0 => days,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_TTL_DAYS".to_string(),
                        format!("'{}' is not a positive number of days", raw),
                    ))
                }
            },
            None => defaults.session_ttl_days,
        };

        let session_cookie_secure = match lookup("SESSION_COOKIE_SECURE") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue("SESSION_COOKIE_SECURE".to_string(), e.to_string())
            })?,
            None => defaults.session_cookie_secure,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_allowed_origins,
            session_backend,
            session_ttl_days,
            session_cookie_secure,
        })
    }
}
