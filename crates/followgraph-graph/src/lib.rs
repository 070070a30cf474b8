//! followgraph-graph: the in-memory follow graph.
//!
//! `GraphStore` is the single mutation point for vertices and edges during
//! a crawl. Its `IdentityIndex` guarantees at most one vertex per external
//! account id. Finished graphs leave the process through a `GraphSink`.

pub mod graphson;
pub mod sink;
pub mod store;

pub use sink::{ExportReport, FileSink, GraphSink, SinkError};
pub use store::{Edge, GraphError, GraphStore, IdentityIndex, Vertex};
