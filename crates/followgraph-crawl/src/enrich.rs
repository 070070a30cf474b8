//! Batched profile enrichment.
//!
//! Every vertex id is sent to the account source in contiguous batches of
//! at most `batch_size` ids. Returned profiles are applied onto the vertices
//! that already exist; enrichment never creates vertices.

use followgraph_core::{AccountSource, ExternalId, Profile};
use followgraph_graph::GraphStore;

use crate::crawler::Phase;
use crate::error::{CrawlError, Result};

/// Remote lookup ceiling of 100 ids, minus one of headroom.
pub const DEFAULT_BATCH_SIZE: usize = 99;

/// Split `ids` into contiguous batches of at most `max` ids.
///
/// A batch is flushed when it is full or when the input runs out, so the
/// last batch may be smaller. A `max` of zero is treated as one.
pub fn chunk_ids(ids: &[ExternalId], max: usize) -> Vec<&[ExternalId]> {
    ids.chunks(max.max(1)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Lookup requests issued.
    pub batches: usize,
    /// Ids sent across all batches.
    pub requested: usize,
    /// Profiles returned and applied.
    pub profiles_applied: usize,
    /// Attribute values written onto vertices.
    pub attributes_set: usize,
}

pub struct ProfileEnricher<'a, S: ?Sized> {
    source: &'a S,
    batch_size: usize,
}

impl<'a, S: AccountSource + ?Sized> ProfileEnricher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Fetch and apply profiles for every vertex currently in `store`.
    ///
    /// One batch is in flight at a time and its results are applied before
    /// the next is requested. Ids with no returned profile keep empty
    /// attributes.
    pub async fn enrich_all(&self, store: &mut GraphStore) -> Result<EnrichReport> {
        let ids = store.vertex_ids();
        let mut report = EnrichReport::default();

        for (n, batch) in chunk_ids(&ids, self.batch_size).into_iter().enumerate() {
            let profiles = self
                .source
                .lookup_profiles(batch)
                .await
                .map_err(|e| CrawlError::remote(Phase::Enriching, e))?;

            tracing::debug!(
                batch = n + 1,
                requested = batch.len(),
                returned = profiles.len(),
                "Profile batch fetched"
            );

            for profile in &profiles {
                report.attributes_set += apply_profile(store, profile)?;
            }

            report.batches += 1;
            report.requested += batch.len();
            report.profiles_applied += profiles.len();
        }

        tracing::info!(
            batches = report.batches,
            requested = report.requested,
            profiles = report.profiles_applied,
            missing = report.requested.saturating_sub(report.profiles_applied),
            "Profiles enriched"
        );

        Ok(report)
    }
}

/// Copy the present attributes of `profile` onto its vertex.
///
/// Every requested id came from an existing vertex, so a profile without a
/// vertex means the identity index is out of sync.
fn apply_profile(store: &mut GraphStore, profile: &Profile) -> Result<usize> {
    let handle = store
        .find_vertex(profile.id)
        .ok_or(CrawlError::IndexInvariantViolation {
            external_id: profile.id,
        })?;

    let mut written = 0;
    for (key, value) in profile.present_attributes() {
        store
            .set_attribute(handle, key, value)
            .map_err(|e| CrawlError::graph(Phase::Enriching, e))?;
        written += 1;
    }
    Ok(written)
}
