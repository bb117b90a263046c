//! Configuration infrastructure
//!
//! Contains configuration loading and validation for the harvester.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional TOML file (`HARVESTER_CONFIG`, `./harvester.toml`, or the user config dir)
//! 3. Environment variables, e.g. `HARVESTER__HARVEST__CONCURRENCY=4`

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading or validation failure
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote catalog and pipeline tuning
    pub harvest: HarvestConfig,

    /// Local store
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Every tunable of the harvest pipeline.
///
/// Passed to the orchestrator at construction so tests can run with small
/// values (e.g. concurrency 2, chunk 3) without touching globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// API root, e.g. `https://www.swapi.tech/api`
    pub base_url: String,

    /// Collection path segment under the API root (`people`)
    pub collection: String,

    /// Entities requested per listing page
    pub page_limit: u32,

    /// Admission gate capacity for concurrent detail fetches
    pub concurrency: usize,

    /// Identifiers per chunk; a checkpoint follows every chunk
    pub chunk_size: usize,

    /// Attempts per request, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each further attempt
    pub base_delay_ms: u64,

    /// Total timeout of a single GET
    pub request_timeout_seconds: u64,

    /// Also stop discovery after a page with fewer than `page_limit` entries
    pub stop_on_short_page: bool,

    /// User agent string
    pub user_agent: String,

    /// Static headers sent with every request (`Accept: application/json` is always added)
    pub headers: BTreeMap<String, String>,
}

/// Local store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:swapi.db`
    pub url: String,

    /// Pool size
    pub max_connections: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output (stderr)
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Rolling log file prefix
    pub file_prefix: String,

    /// Module-specific log level filters (e.g., "sqlx": "warn", "reqwest": "info")
    pub module_filters: BTreeMap<String, String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            collection: defaults::COLLECTION.to_string(),
            page_limit: defaults::PAGE_LIMIT,
            concurrency: defaults::CONCURRENCY,
            chunk_size: defaults::CHUNK_SIZE,
            max_attempts: defaults::MAX_ATTEMPTS,
            base_delay_ms: defaults::BASE_DELAY_MS,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            stop_on_short_page: false,
            user_agent: defaults::USER_AGENT.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_prefix: defaults::LOG_FILE_PREFIX.to_string(),
            module_filters: {
                let mut filters = BTreeMap::new();
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("tokio".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl HarvestConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Reject values that would stall or break the pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, u64); 5] = [
            ("harvest.page_limit", u64::from(self.page_limit)),
            ("harvest.concurrency", self.concurrency as u64),
            ("harvest.chunk_size", self.chunk_size as u64),
            ("harvest.max_attempts", u64::from(self.max_attempts)),
            ("harvest.request_timeout_seconds", self.request_timeout_seconds),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.collection.trim().is_empty() || self.collection.contains('/') {
            return Err(ConfigError::Invalid {
                field: "harvest.collection",
                reason: format!("'{}' is not a single path segment", self.collection),
            });
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration manager for locating and loading settings
pub struct ConfigManager {
    pub config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Directory holding the per-user config file
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME))
    }

    /// Locate the config file: `HARVESTER_CONFIG`, then `./harvester.toml`,
    /// then `<config dir>/swapi-harvester/harvester.toml`
    pub fn new() -> Self {
        let config_path = std::env::var_os(defaults::CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
                local.exists().then_some(local)
            })
            .or_else(|| {
                Self::get_config_dir()
                    .map(|dir| dir.join(defaults::CONFIG_FILE_NAME))
                    .filter(|path| path.exists())
            });

        Self { config_path }
    }

    /// Use an explicit config file
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            config_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Load configuration from defaults, file and environment, then validate it
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.config_path {
            info!("📁 Loading configuration from: {:?}", path);
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        } else {
            debug!("No configuration file found, using defaults and environment");
        }

        let app_config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        app_config.harvest.validate()?;
        Ok(app_config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Default values
pub mod defaults {
    /// API root of the remote catalog
    pub const BASE_URL: &str = "https://www.swapi.tech/api";

    /// Harvested collection
    pub const COLLECTION: &str = "people";

    /// Entities per listing page
    pub const PAGE_LIMIT: u32 = 100;

    /// Concurrent detail fetches
    pub const CONCURRENCY: usize = 20;

    /// Identifiers between checkpoints
    pub const CHUNK_SIZE: usize = 200;

    /// Attempts per request
    pub const MAX_ATTEMPTS: u32 = 3;

    /// First backoff delay in milliseconds
    pub const BASE_DELAY_MS: u64 = 500;

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const USER_AGENT: &str = "swapi-harvester/0.1";

    /// SQLite database next to the working directory
    pub const DATABASE_URL: &str = "sqlite:swapi.db";

    pub const DB_MAX_CONNECTIONS: u32 = 5;

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_FILE_PREFIX: &str = "harvest.log";

    pub const APP_DIR_NAME: &str = "swapi-harvester";

    pub const CONFIG_FILE_NAME: &str = "harvester.toml";

    /// Explicit config file path
    pub const CONFIG_PATH_ENV: &str = "HARVESTER_CONFIG";

    /// Prefix of override variables (`HARVESTER__HARVEST__PAGE_LIMIT`)
    pub const ENV_PREFIX: &str = "HARVESTER";
}
