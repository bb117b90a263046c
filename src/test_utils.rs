//! Test utilities for the harvester
//!
//! Provides a scripted in-process [`Transport`] and an in-memory
//! [`PersistenceSink`] so pipeline tests run without network or database.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::crawling::endpoints::CatalogEndpoints;
use crate::domain::{Identifier, PersistenceSink, PersonRecord, StoreError};
use crate::infrastructure::http_client::{RawPayload, Transport, TransportError};

type Scripted = Result<RawPayload, TransportError>;

/// Transport answering from per-URL scripts.
///
/// Responses queued for a URL are served in order; the last one repeats.
/// Unknown URLs answer 404. Tracks call counts and the in-flight high-water mark.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn respond(&self, url: impl Into<String>, response: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|called| *called == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> Scripted {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(TransportError::HttpStatus {
                status: 404,
                body: format!("no script for {url}"),
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawPayload, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = self.next_response(url);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// Script a listing of `uids` split into pages of `page_limit`, ending with an empty page
pub fn script_listing(
    transport: &ScriptedTransport,
    endpoints: &CatalogEndpoints,
    uids: &[&str],
    page_limit: u32,
) {
    let mut page_number = 1;
    for page in uids.chunks(page_limit as usize) {
        let results: Vec<_> = page.iter().map(|uid| json!({"uid": uid, "name": format!("person {uid}")})).collect();
        transport.respond(
            endpoints.list_page_url(page_number, page_limit),
            Ok(json!({"message": "ok", "results": results})),
        );
        page_number += 1;
    }
    transport.respond(
        endpoints.list_page_url(page_number, page_limit),
        Ok(json!({"message": "ok", "results": []})),
    );
}

/// Detail payload in the remote shape
pub fn detail_payload(uid: &str, name: &str) -> RawPayload {
    json!({
        "message": "ok",
        "result": {
            "uid": uid,
            "properties": {
                "name": name,
                "gender": "n/a",
                "mass": "32"
            }
        }
    })
}

pub fn identifiers(raw: &[&str]) -> Vec<Identifier> {
    raw.iter().filter_map(|uid| Identifier::parse(uid)).collect()
}

/// What happened to a [`MemorySink`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Upsert(i64),
    Checkpoint,
}

/// In-memory sink with the same commit semantics as the SQLite repository
#[derive(Debug, Default)]
pub struct MemorySink {
    pub committed: BTreeMap<i64, PersonRecord>,
    pub pending: BTreeMap<i64, PersonRecord>,
    pub events: Vec<SinkEvent>,
    pub schema_ready: bool,
    pub fail_upserts: bool,
}

impl MemorySink {
    pub fn upserts(&self) -> usize {
        self.events.iter().filter(|event| matches!(event, SinkEvent::Upsert(_))).count()
    }

    pub fn checkpoints(&self) -> usize {
        self.events.iter().filter(|event| **event == SinkEvent::Checkpoint).count()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.schema_ready = true;
        Ok(())
    }

    async fn upsert(&mut self, record: &PersonRecord) -> Result<(), StoreError> {
        if self.fail_upserts {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.pending.insert(record.id, record.clone());
        self.events.push(SinkEvent::Upsert(record.id));
        Ok(())
    }

    async fn checkpoint(&mut self) -> Result<(), StoreError> {
        self.committed.append(&mut self.pending);
        self.events.push(SinkEvent::Checkpoint);
        Ok(())
    }
}
