// Database connection and pool management
// This module handles SQLite database connections using sqlx

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// DDL for the harvested table. Every attribute is nullable text.
pub const CREATE_PEOPLE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS people (
        id INTEGER PRIMARY KEY,
        name TEXT,
        birth_year TEXT,
        eye_color TEXT,
        gender TEXT,
        hair_color TEXT,
        homeworld TEXT,
        mass TEXT,
        skin_color TEXT
    )
"#;

pub struct DatabaseConnection {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let path = database_path(database_url);

        // Create database file directory if it doesn't exist
        if let Some(parent) = path.as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", database_url))?;

        debug!("🗄️ Connected to {}", database_url);
        Ok(Self { pool, path })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// File backing the pool, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_PEOPLE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to create people table")?;

        info!("✅ Schema ready (people)");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Extract the file path from a `sqlite:` url.
///
/// Returns `None` for in-memory databases.
pub fn database_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Whether the database file behind `database_url` is already on disk
pub fn database_exists(database_url: &str) -> bool {
    database_path(database_url).is_some_and(|path| path.exists())
}
