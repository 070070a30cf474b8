//! followgraph-crawl: builds a follow graph from seed accounts.
//!
//! For each seed, resolves the account and materializes its outbound
//! `follows` edges, then enriches every discovered account with profile
//! attributes in bounded batches and exports the graph through a sink.

pub mod config;
pub mod crawler;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod testing;

pub use crawler::{CrawlSummary, Crawler, Phase};
pub use enrich::{chunk_ids, EnrichReport, ProfileEnricher, DEFAULT_BATCH_SIZE};
pub use error::{CrawlError, Result};
pub use ingest::{FollowIngester, IngestReport};
