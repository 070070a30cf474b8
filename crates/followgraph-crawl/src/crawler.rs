//! Crawl orchestration.
//!
//! A run moves strictly forward through
//! `Init → Ingesting → Enriching → Exporting → Done`; any error moves it to
//! `Failed` and nothing is exported.

use std::fmt;

use chrono::{DateTime, Utc};
use followgraph_core::AccountSource;
use followgraph_graph::{ExportReport, GraphSink, GraphStore};
use serde::Serialize;
use uuid::Uuid;

use crate::enrich::{EnrichReport, ProfileEnricher, DEFAULT_BATCH_SIZE};
use crate::error::{CrawlError, Result};
use crate::ingest::FollowIngester;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Ingesting,
    Enriching,
    Exporting,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Ingesting => "Ingesting",
            Self::Enriching => "Enriching",
            Self::Exporting => "Exporting",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub run_id: Uuid,
    pub seeds: usize,
    pub vertices: usize,
    pub edges: usize,
    pub batches: usize,
    pub profiles_applied: usize,
    pub attributes_set: usize,
    pub destination: String,
    pub bytes_written: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs one bounded crawl-and-enrich pass and hands the graph to a sink.
pub struct Crawler<S, K> {
    source: S,
    sink: K,
    seeds: Vec<String>,
    batch_size: usize,
    phase: Phase,
    run_id: Uuid,
}

impl<S: AccountSource, K: GraphSink> Crawler<S, K> {
    pub fn new(source: S, sink: K, seeds: Vec<String>) -> Self {
        Self {
            source,
            sink,
            seeds,
            batch_size: DEFAULT_BATCH_SIZE,
            phase: Phase::Init,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Ingest every seed, enrich once, export once. A crawler runs once.
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        if self.phase != Phase::Init {
            return Err(CrawlError::Config(format!(
                "crawler {} already ran (phase {})",
                self.run_id, self.phase
            )));
        }

        let started_at = Utc::now();
        tracing::info!(run_id = %self.run_id, seeds = self.seeds.len(), "Crawl started");

        let mut store = GraphStore::new();
        match self.execute(&mut store).await {
            Ok((enrich, export)) => {
                self.transition(Phase::Done);
                let summary = CrawlSummary {
                    run_id: self.run_id,
                    seeds: self.seeds.len(),
                    vertices: store.vertex_count(),
                    edges: store.edge_count(),
                    batches: enrich.batches,
                    profiles_applied: enrich.profiles_applied,
                    attributes_set: enrich.attributes_set,
                    destination: export.destination,
                    bytes_written: export.bytes,
                    started_at,
                    finished_at: Utc::now(),
                };

                tracing::info!(
                    run_id = %summary.run_id,
                    vertices = summary.vertices,
                    edges = summary.edges,
                    batches = summary.batches,
                    destination = %summary.destination,
                    duration_ms = (summary.finished_at - started_at).num_milliseconds(),
                    "Crawl complete"
                );
                Ok(summary)
            }
            Err(e) => {
                let failed_in = self.phase;
                self.transition(Phase::Failed);
                tracing::error!(
                    run_id = %self.run_id,
                    phase = %failed_in,
                    error = %e,
                    "Crawl failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(&mut self, store: &mut GraphStore) -> Result<(EnrichReport, ExportReport)> {
        self.transition(Phase::Ingesting);
        let ingester = FollowIngester::new(&self.source);
        for (n, seed) in self.seeds.iter().enumerate() {
            tracing::debug!(seed = %seed, position = n + 1, "Ingesting seed");
            ingester.ingest_seed(store, seed).await?;
        }

        self.transition(Phase::Enriching);
        let enrich = ProfileEnricher::new(&self.source)
            .with_batch_size(self.batch_size)
            .enrich_all(store)
            .await?;

        self.transition(Phase::Exporting);
        let export = self.sink.export(store)?;

        Ok((enrich, export))
    }

    fn transition(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phase {next} cannot follow {}", self.phase);
        tracing::info!(run_id = %self.run_id, from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
    }
}
