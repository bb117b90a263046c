//! Repository contracts used by the harvest pipeline.
//!
//! The pipeline only ever needs three things from a store: make sure the
//! schema exists, write one record by key, and commit what has been written.

use async_trait::async_trait;
use thiserror::Error;

use super::person::PersonRecord;

/// Store-level failure. Unlike fetch failures these are fatal for a run.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed, idempotent write path with an explicit commit boundary
#[async_trait]
pub trait PersistenceSink: Send {
    /// Create the backing table if it does not exist yet
    async fn ensure_schema(&mut self) -> Result<(), StoreError>;

    /// Insert the record, or overwrite every attribute of the row with the same key
    async fn upsert(&mut self, record: &PersonRecord) -> Result<(), StoreError>;

    /// Make every write since the previous checkpoint durable
    async fn checkpoint(&mut self) -> Result<(), StoreError>;
}
