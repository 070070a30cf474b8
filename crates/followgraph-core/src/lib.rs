//! followgraph-core: Shared types for the followgraph crawler.
//!
//! This crate provides the foundational types used across all followgraph components:
//! - Identity types (`ExternalId`, `VertexHandle`) for account vertices
//! - The closed attribute set copied from remote profiles
//! - The `AccountSource` capability consumed by ingestion and enrichment
//! - The error taxonomy for remote account lookups

pub mod error;
pub mod source;
pub mod types;

pub use error::SourceError;
pub use source::AccountSource;
pub use types::{Account, AttributeKey, EdgeLabel, ExternalId, Profile, VertexHandle};
