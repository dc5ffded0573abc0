//! # Configuration
//!
//! Environment-driven settings for the plant manager. The binary loads a
//! `.env` file with `dotenvy` before calling [`Config::from_env`].
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Catalog page size and reminder poll interval are configurable
//! - 1.0.0: Initial release with database path and log level

use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "plant_manager.db";
pub const DEFAULT_CATALOG_API_URL: &str = "http://localhost:3333";
pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 8;
pub const DEFAULT_REMINDER_POLL_SECONDS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must not be empty")]
    Empty { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file holding users, plants and pending notifications
    pub database_path: String,
    /// Base URL of the plant catalog API
    pub catalog_api_url: String,
    /// Plants fetched per catalog page
    pub catalog_page_size: u32,
    /// How often the reminder loop looks for due notifications
    pub reminder_poll_interval: Duration,
    /// Default env_logger filter
    pub log_level: String,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("PLANT_MANAGER_DB")
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        if database_path.trim().is_empty() {
            return Err(ConfigError::Empty {
                name: "PLANT_MANAGER_DB",
            });
        }

        let catalog_api_url = lookup("CATALOG_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_CATALOG_API_URL.to_string());
        if catalog_api_url.trim().is_empty() {
            return Err(ConfigError::Empty {
                name: "CATALOG_API_URL",
            });
        }

        let catalog_page_size = parse_positive(
            "CATALOG_PAGE_SIZE",
            lookup("CATALOG_PAGE_SIZE"),
            DEFAULT_CATALOG_PAGE_SIZE as u64,
        )? as u32;

        let poll_seconds = parse_positive(
            "REMINDER_POLL_SECONDS",
            lookup("REMINDER_POLL_SECONDS"),
            DEFAULT_REMINDER_POLL_SECONDS,
        )?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Config {
            database_path,
            catalog_api_url,
            catalog_page_size,
            reminder_poll_interval: Duration::from_secs(poll_seconds),
            log_level,
        })
    }
}

fn parse_positive(
    name: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 && value <= u32::MAX as u64 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { name, value: raw }),
    }
}
