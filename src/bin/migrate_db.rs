//! Create the `people` table if it does not exist yet.
//!
//! Run with: cargo run --bin migrate_db

use anyhow::{Context, Result};
use tracing::info;

use swapi_harvester_lib::infrastructure::{ConfigManager, DatabaseConnection, init_logging_with_config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigManager::new()
        .load_config()
        .context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;

    info!("🗄️ Migrating {}", config.database.url);
    let db = DatabaseConnection::new(&config.database.url, config.database.max_connections).await?;
    db.migrate().await?;
    db.close().await;

    println!("✅ Schema ready: {}", config.database.url);
    Ok(())
}
