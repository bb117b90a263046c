//! # Harvest Orchestrator
//!
//! Sequences a harvest run: `Init → Discovering → Harvesting → Done`.
//! Owns chunking and the checkpoint after every chunk, and publishes
//! progress on a watch channel.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::crawling::detail_collector::DetailCollector;
use crate::crawling::endpoints::CatalogEndpoints;
use crate::crawling::page_walker::PageWalker;
use crate::domain::{PersistenceSink, StoreError};
use crate::infrastructure::config::{ConfigError, HarvestConfig};
use crate::infrastructure::http_client::{HttpClient, Transport};
use crate::infrastructure::retry_manager::{RetryPolicy, RetryingFetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPhase {
    Init,
    Discovering,
    Harvesting,
    Done,
}

/// Snapshot published after every phase change and every chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestProgress {
    pub phase: HarvestPhase,
    pub identifiers_found: usize,
    /// Identifiers whose chunk has been checkpointed
    pub processed: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub checkpoints: usize,
}

impl HarvestProgress {
    fn initial() -> Self {
        Self {
            phase: HarvestPhase::Init,
            identifiers_found: 0,
            processed: 0,
            persisted: 0,
            skipped: 0,
            checkpoints: 0,
        }
    }
}

/// Final counts of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub run_id: Uuid,
    pub identifiers_found: usize,
    pub records_persisted: usize,
    pub skipped: usize,
    pub checkpoints: usize,
    pub elapsed: Duration,
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "found {}, persisted {}", self.identifiers_found, self.records_persisted)
    }
}

/// The only way a run fails. Fetch problems are absorbed as skips.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

pub struct HarvestOrchestrator {
    walker: PageWalker,
    collector: DetailCollector,
    chunk_size: usize,
    progress: watch::Sender<HarvestProgress>,
}

impl HarvestOrchestrator {
    /// Wire the pipeline over any [`Transport`]
    pub fn new(config: &HarvestConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        config.validate()?;

        let endpoints = CatalogEndpoints::from_harvest_config(config)?;
        let fetcher = RetryingFetcher::new(transport, RetryPolicy::from_harvest_config(config));
        let walker = PageWalker::new(
            fetcher.clone(),
            endpoints.clone(),
            config.page_limit,
            config.stop_on_short_page,
        );
        let collector = DetailCollector::new(fetcher, endpoints, config.concurrency);
        let (progress, _) = watch::channel(HarvestProgress::initial());

        Ok(Self {
            walker,
            collector,
            chunk_size: config.chunk_size,
            progress,
        })
    }

    /// Wire the pipeline over the reqwest transport
    pub fn from_config(config: &HarvestConfig) -> anyhow::Result<Self> {
        let transport = HttpClient::from_harvest_config(config)?;
        Ok(Self::new(config, Arc::new(transport))?)
    }

    /// Progress of the current or last run
    pub fn subscribe(&self) -> watch::Receiver<HarvestProgress> {
        self.progress.subscribe()
    }

    /// Run one harvest into `sink`.
    ///
    /// Discovery failures leave fewer (possibly zero) identifiers; detail
    /// failures are skipped. Only store errors end the run early, and every
    /// chunk checkpointed before that stays committed.
    pub async fn run<S>(&self, sink: &mut S) -> Result<HarvestSummary, OrchestratorError>
    where
        S: PersistenceSink + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("harvest", run_id = %run_id);
        self.run_inner(run_id, sink).instrument(span).await
    }

    async fn run_inner<S>(&self, run_id: Uuid, sink: &mut S) -> Result<HarvestSummary, OrchestratorError>
    where
        S: PersistenceSink + ?Sized,
    {
        let started = Instant::now();
        let mut progress = HarvestProgress::initial();
        self.progress.send_replace(progress.clone());

        info!("🚀 Harvest started");
        sink.ensure_schema().await?;

        progress.phase = HarvestPhase::Discovering;
        self.progress.send_replace(progress.clone());
        let identifiers = self.walker.collect_all_identifiers().await;
        let total = identifiers.len();
        progress.identifiers_found = total;

        if total > 0 {
            progress.phase = HarvestPhase::Harvesting;
            self.progress.send_replace(progress.clone());

            for chunk in identifiers.chunks(self.chunk_size.max(1)) {
                let report = self.collector.collect(chunk, sink).await?;
                sink.checkpoint().await?;

                progress.processed += chunk.len();
                progress.persisted += report.persisted;
                progress.skipped += report.skipped_count();
                progress.checkpoints += 1;
                self.progress.send_replace(progress.clone());

                info!("✅ Saved {} / {}", progress.processed, total);
            }
        }

        progress.phase = HarvestPhase::Done;
        self.progress.send_replace(progress.clone());

        let summary = HarvestSummary {
            run_id,
            identifiers_found: total,
            records_persisted: progress.persisted,
            skipped: progress.skipped,
            checkpoints: progress.checkpoints,
            elapsed: started.elapsed(),
        };
        info!("🏁 Done: {} ({} skipped, {:?})", summary, summary.skipped, summary.elapsed);
        Ok(summary)
    }
}
