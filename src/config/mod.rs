//! Runtime settings
//!
//! Read from `config.yml`, then patched by `PROCTRACK_*` environment
//! variables. Every field has a default; with no file at all the server runs
//! on a local SQLite database.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Catalog (process types, statuses, documents, rules) bootstrap
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin, or `*`
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Storage backend and location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// SQLite path (`:memory:` allowed) or MySQL URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/proctrack.db".to_string()
}

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Sqlite,
    Mysql,
}

/// Catalog bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Install any missing default process types, statuses, documents and
    /// legal deadlines when the server starts
    #[serde(default = "default_seed_defaults")]
    pub seed_defaults: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed_defaults: default_seed_defaults(),
        }
    }
}

fn default_seed_defaults() -> bool {
    true
}

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "PROCTRACK_";

/// Errors raised while reading or checking `config.yml`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Read `path`. A missing or blank file gives the defaults; a malformed
    /// one fails with the YAML line and column.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::FileRead {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: describe_yaml_error(&e),
        })
    }

    /// `load`, then `PROCTRACK_*` overrides, then `validate`.
    ///
    /// Recognised variables: `PROCTRACK_SERVER_HOST`, `PROCTRACK_SERVER_PORT`,
    /// `PROCTRACK_SERVER_CORS_ORIGIN`, `PROCTRACK_DATABASE_DRIVER`,
    /// `PROCTRACK_DATABASE_URL`, `PROCTRACK_CATALOG_SEED_DEFAULTS`.
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up by key (without prefix). Values that do not
    /// parse leave the current setting alone.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(origin) = lookup("SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(driver) = lookup("DATABASE_DRIVER").and_then(|v| DatabaseDriver::parse(&v)) {
            self.database.driver = driver;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(seed) = lookup("CATALOG_SEED_DEFAULTS").and_then(|v| parse_flag(&v)) {
            self.catalog.seed_defaults = seed;
        }
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host is empty".to_string()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".to_string()));
        }
        Ok(())
    }
}

impl DatabaseDriver {
    /// Case-insensitive driver name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(DatabaseDriver::Sqlite),
            "mysql" => Some(DatabaseDriver::Mysql),
            _ => None,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn describe_yaml_error(e: &serde_yaml::Error) -> String {
    match e.location() {
        Some(at) => format!("line {}, column {}: {}", at.line(), at.column(), e),
        None => e.to_string(),
    }
}

// Tests touching process environment share this lock.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any port override that parses as u16 wins; anything else keeps the file value.
        #[test]
        fn port_override_applies_only_when_valid(raw in "[0-9a-z]{0,6}") {
            let mut config = Config::default();
            let value = raw.clone();
            config.apply_overrides(move |key| (key == "SERVER_PORT").then(|| value.clone()));

            let expected = raw.parse::<u16>().unwrap_or(8000);
            prop_assert_eq!(config.server.port, expected);
        }
    }
}
