//! Infrastructure layer: configuration, logging, HTTP transport and SQLite storage
//!
//! Everything that touches the outside world lives here. The crawling layer
//! only sees the [`Transport`] and [`crate::domain::PersistenceSink`] seams.

pub mod config; // Layered configuration and defaults
pub mod database_connection;
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod people_repository;
pub mod retry_manager;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, ConfigManager, DatabaseConfig, HarvestConfig, LoggingConfig};
pub use database_connection::{DatabaseConnection, database_exists, database_path};
pub use http_client::{HttpClient, HttpClientConfig, RawPayload, Transport, TransportError};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use people_repository::PeopleRepository;
pub use retry_manager::{RetryPolicy, RetryingFetcher};
