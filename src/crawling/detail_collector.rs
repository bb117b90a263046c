//! # Bounded Detail Collector
//!
//! Fetches one detail payload per identifier with at most `capacity` requests
//! in flight. Payloads come back through the task join handles and are
//! written by the calling task only, so the sink is never shared.

use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::crawling::endpoints::CatalogEndpoints;
use crate::domain::{Identifier, MalformedPayload, PersistenceSink, PersonRecord, StoreError};
use crate::infrastructure::http_client::RawPayload;
use crate::infrastructure::retry_manager::RetryingFetcher;

/// Why an identifier produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fetch failed permanently or exhausted its attempts
    Unavailable,
    /// Payload lacked `result.properties` or a usable `result.uid`
    Malformed(MalformedPayload),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("detail unavailable"),
            Self::Malformed(reason) => write!(f, "malformed payload: {}", reason),
        }
    }
}

/// Outcome of one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    pub dispatched: usize,
    pub persisted: usize,
    pub skipped: Vec<(Identifier, SkipReason)>,
    /// Tasks that panicked or were cancelled before returning
    pub failed_tasks: usize,
}

impl ChunkReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len() + self.failed_tasks
    }
}

pub struct DetailCollector {
    fetcher: RetryingFetcher,
    endpoints: CatalogEndpoints,
    gate: Arc<Semaphore>,
    capacity: usize,
}

impl DetailCollector {
    pub fn new(fetcher: RetryingFetcher, endpoints: CatalogEndpoints, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            fetcher,
            endpoints,
            gate: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch every identifier of one chunk and upsert each usable record.
    ///
    /// Returns once every dispatched fetch has finished. Does not checkpoint;
    /// that is the caller's chunk boundary. Only store failures are errors;
    /// dropping the returned future aborts the outstanding fetches.
    pub async fn collect<S>(&self, identifiers: &[Identifier], sink: &mut S) -> Result<ChunkReport, StoreError>
    where
        S: PersistenceSink + ?Sized,
    {
        let mut tasks: JoinSet<(Identifier, Option<RawPayload>)> = JoinSet::new();

        for identifier in identifiers {
            let fetcher = self.fetcher.clone();
            let gate = Arc::clone(&self.gate);
            let url = self.endpoints.detail_url(identifier);
            let identifier = identifier.clone();

            tasks.spawn(async move {
                // Permit is held for the whole fetch, retries included
                let Ok(_permit) = gate.acquire_owned().await else {
                    return (identifier, None);
                };
                let payload = fetcher.fetch(&url).await;
                (identifier, payload)
            });
        }

        let mut report = ChunkReport {
            dispatched: identifiers.len(),
            ..ChunkReport::default()
        };

        while let Some(joined) = tasks.join_next().await {
            let (identifier, payload) = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Detail task failed: {}", e);
                    report.failed_tasks += 1;
                    continue;
                }
            };

            let Some(payload) = payload else {
                warn!("⚠️ Skipping {}: {}", identifier, SkipReason::Unavailable);
                report.skipped.push((identifier, SkipReason::Unavailable));
                continue;
            };

            match PersonRecord::from_detail(&payload) {
                Ok(record) => {
                    sink.upsert(&record).await?;
                    report.persisted += 1;
                    debug!("Upserted {} (id {})", identifier, record.id);
                }
                Err(reason) => {
                    let reason = SkipReason::Malformed(reason);
                    warn!("⚠️ Skipping {}: {}", identifier, reason);
                    report.skipped.push((identifier, reason));
                }
            }
        }

        Ok(report)
    }
}
