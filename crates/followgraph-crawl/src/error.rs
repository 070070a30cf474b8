//! Error types for the followgraph-crawl crate.
//!
//! Every variant aborts the run. Messages name the phase that failed.

use followgraph_core::{ExternalId, SourceError};
use followgraph_graph::{GraphError, SinkError};
use thiserror::Error;

use crate::crawler::Phase;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Ingesting failed: seed account not found: {screen_name}")]
    SeedNotFound { screen_name: String },

    #[error("{phase} failed: {source}")]
    Remote {
        phase: Phase,
        #[source]
        source: SourceError,
    },

    #[error(
        "Enriching failed: profile returned for {external_id} but no vertex exists for it"
    )]
    IndexInvariantViolation { external_id: ExternalId },

    #[error("{phase} failed: {source}")]
    Graph {
        phase: Phase,
        #[source]
        source: GraphError,
    },

    #[error("Exporting failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrawlError {
    pub fn remote(phase: Phase, source: SourceError) -> Self {
        CrawlError::Remote { phase, source }
    }

    pub fn graph(phase: Phase, source: GraphError) -> Self {
        CrawlError::Graph { phase, source }
    }
}

impl From<config::ConfigError> for CrawlError {
    fn from(err: config::ConfigError) -> Self {
        CrawlError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
