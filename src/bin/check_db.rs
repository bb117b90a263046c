//! Inspect the harvested database: existence, table, row count, columns, first rows.
//!
//! Run with: cargo run --bin check_db

use anyhow::{Context, Result};

use swapi_harvester_lib::infrastructure::{ConfigManager, database_exists};
use swapi_harvester_lib::open_repository;

const SAMPLE_ROWS: i64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigManager::new()
        .load_config()
        .context("Failed to load configuration")?;
    let url = &config.database.url;

    println!("🔍 Database: {}", url);
    if !database_exists(url) {
        println!("❌ Database file does not exist");
        return Ok(());
    }

    let (db, repository) = open_repository(&config).await?;

    if !repository.table_exists().await? {
        println!("❌ Table 'people' does not exist (run migrate_db or harvest first)");
        db.close().await;
        return Ok(());
    }

    println!("✅ Table 'people' exists");
    println!("📊 Rows: {}", repository.count().await?);
    println!("📋 Columns: {}", repository.column_names().await?.join(", "));

    let sample = repository.sample(SAMPLE_ROWS).await?;
    println!("\n🔍 First {} rows:", sample.len());
    for record in sample {
        println!(
            "   {}. {} ({}, born {})",
            record.id,
            record.name.as_deref().unwrap_or("Unknown"),
            record.gender.as_deref().unwrap_or("-"),
            record.birth_year.as_deref().unwrap_or("-")
        );
    }

    db.close().await;
    Ok(())
}
