//! SWAPI Harvester - incremental catalog harvesting into SQLite
//!
//! Walks the paginated listing of a remote collection, fetches every detail
//! under a fixed concurrency budget with retry and backoff, and upserts the
//! normalized records with a commit after every chunk.

// Module declarations
pub mod crawling;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub use crawling::{HarvestOrchestrator, HarvestPhase, HarvestProgress, HarvestSummary};
pub use domain::{Identifier, PersistenceSink, PersonRecord};
pub use infrastructure::{AppConfig, ConfigManager, DatabaseConnection, PeopleRepository};

/// Open the configured database and a repository over it
pub async fn open_repository(config: &AppConfig) -> Result<(DatabaseConnection, PeopleRepository)> {
    let db = DatabaseConnection::new(&config.database.url, config.database.max_connections).await?;
    let repository = PeopleRepository::new(Arc::new(db.pool().clone()));
    Ok((db, repository))
}

/// One harvest with an already loaded configuration
pub async fn run_with_config(config: &AppConfig) -> Result<HarvestSummary> {
    let orchestrator = HarvestOrchestrator::from_config(&config.harvest)?;
    let (db, mut repository) = open_repository(config).await?;

    info!("🗄️ Using database: {}", config.database.url);
    let summary = orchestrator
        .run(&mut repository)
        .await
        .context("Harvest aborted")?;

    db.close().await;
    Ok(summary)
}

/// Load configuration, initialize logging and run one harvest
pub async fn run() -> Result<HarvestSummary> {
    let config = ConfigManager::new()
        .load_config()
        .context("Failed to load configuration")?;
    infrastructure::init_logging_with_config(&config.logging)?;

    run_with_config(&config).await
}
