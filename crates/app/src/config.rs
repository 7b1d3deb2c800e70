//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown snapshot backend: {0} (expected memory, file or postgres)")]
    UnknownBackend(String),

    #[error("DATABASE_URL is required for the postgres backend")]
    MissingDatabaseUrl,
}

/// Where restaurant snapshots are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Memory,
    File,
    Postgres,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "postgres" => Ok(Self::Postgres),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Runtime configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `SNAPSHOT_BACKEND`: `memory`, `file` or `postgres` (default: `memory`)
/// - `SNAPSHOT_PATH`: snapshot file for the file backend (default: `restaurant.json`)
/// - `DATABASE_URL`: connection string, required by the postgres backend
/// - `RESTAURANT_NAME`: snapshot key in postgres (default: `main`)
/// - `PRINT_METRICS`: print the Prometheus rendering on exit when set
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub backend: Backend,
    pub snapshot_path: PathBuf,
    pub database_url: Option<String>,
    pub restaurant_name: String,
    pub print_metrics: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let backend = match lookup("SNAPSHOT_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if backend == Backend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            backend,
            snapshot_path: lookup("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            database_url,
            restaurant_name: lookup("RESTAURANT_NAME").unwrap_or(defaults.restaurant_name),
            print_metrics: lookup("PRINT_METRICS")
                .is_some_and(|v| !matches!(v.as_str(), "" | "0" | "false")),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            backend: Backend::Memory,
            snapshot_path: PathBuf::from("restaurant.json"),
            database_url: None,
            restaurant_name: "main".to_string(),
            print_metrics: false,
        }
    }
}
