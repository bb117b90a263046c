//! # Crawling Module
//!
//! The harvest pipeline, leaves first:
//! - [`endpoints`]: listing and detail URLs
//! - [`page_walker`]: sequential pagination into the identifier set
//! - [`detail_collector`]: bounded-concurrency detail fetches per chunk
//! - [`orchestrator`]: phases, chunking, checkpoints and progress
//!
//! 명시적 모듈 구조 (mod.rs 비사용)

pub mod detail_collector;
pub mod endpoints;
pub mod orchestrator;
pub mod page_walker;

pub use detail_collector::{ChunkReport, DetailCollector, SkipReason};
pub use endpoints::CatalogEndpoints;
pub use orchestrator::{HarvestOrchestrator, HarvestPhase, HarvestProgress, HarvestSummary, OrchestratorError};
pub use page_walker::PageWalker;
