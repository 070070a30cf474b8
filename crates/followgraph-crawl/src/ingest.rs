//! Seed ingestion: resolve a seed, then materialize its outbound follows.

use followgraph_core::{AccountSource, EdgeLabel, ExternalId, SourceError};
use followgraph_graph::GraphStore;

use crate::crawler::Phase;
use crate::error::{CrawlError, Result};

/// What a single seed contributed to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub seed: String,
    pub seed_id: ExternalId,
    /// Edges added, one per id in the follow list.
    pub edges_added: usize,
    /// Vertices that did not exist before this seed.
    pub vertices_created: usize,
}

/// Adds a seed's follow list to a graph store.
///
/// Ingesting the same seed twice adds its edges twice. Vertices are never
/// duplicated.
pub struct FollowIngester<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: AccountSource + ?Sized> FollowIngester<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub async fn ingest_seed(
        &self,
        store: &mut GraphStore,
        screen_name: &str,
    ) -> Result<IngestReport> {
        let vertices_before = store.vertex_count();

        let account = self
            .source
            .lookup_account(screen_name)
            .await
            .map_err(|e| seed_error(screen_name, e))?;
        let seed_vertex = store.get_or_create_vertex(account.id);

        let followed = self
            .source
            .list_followed_ids(screen_name)
            .await
            .map_err(|e| seed_error(screen_name, e))?;

        for id in &followed {
            let target = store.get_or_create_vertex(*id);
            store
                .add_edge(seed_vertex, target, EdgeLabel::Follows)
                .map_err(|e| CrawlError::graph(Phase::Ingesting, e))?;
        }

        let report = IngestReport {
            seed: screen_name.to_string(),
            seed_id: account.id,
            edges_added: followed.len(),
            vertices_created: store.vertex_count() - vertices_before,
        };

        tracing::info!(
            seed = %report.seed,
            seed_id = %report.seed_id,
            follows = report.edges_added,
            new_vertices = report.vertices_created,
            "Seed ingested"
        );

        Ok(report)
    }
}

fn seed_error(screen_name: &str, err: SourceError) -> CrawlError {
    match err {
        SourceError::NotFound { .. } => CrawlError::SeedNotFound {
            screen_name: screen_name.to_string(),
        },
        other => CrawlError::remote(Phase::Ingesting, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAccountSource;

    #[tokio::test]
    async fn test_seed_and_follows_materialized() {
        let source = MockAccountSource::new().on_account("alice", 100, &[200, 300]);
        let mut store = GraphStore::new();

        let report = FollowIngester::new(&source)
            .ingest_seed(&mut store, "alice")
            .await
            .unwrap();

        assert_eq!(report.seed_id, ExternalId(100));
        assert_eq!(report.edges_added, 2);
        assert_eq!(report.vertices_created, 3);
        assert_eq!(
            store.vertex_ids(),
            vec![ExternalId(100), ExternalId(200), ExternalId(300)]
        );

        let seed = store.find_vertex(ExternalId(100)).unwrap();
        let targets: Vec<ExternalId> = store
            .out_edges(seed)
            .map(|e| store.vertex(e.target).unwrap().external_id)
            .collect();
        assert_eq!(targets, vec![ExternalId(200), ExternalId(300)]);
        assert!(store.edges().iter().all(|e| e.label == EdgeLabel::Follows));
    }

    #[tokio::test]
    async fn test_shared_target_reuses_vertex() {
        let source = MockAccountSource::new()
            .on_account("alice", 100, &[300])
            .on_account("bob", 200, &[300]);
        let mut store = GraphStore::new();
        let ingester = FollowIngester::new(&source);

        ingester.ingest_seed(&mut store, "alice").await.unwrap();
        let bob = ingester.ingest_seed(&mut store, "bob").await.unwrap();

        assert_eq!(bob.vertices_created, 1);
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.edge_count(), 2);

        let shared = store.find_vertex(ExternalId(300)).unwrap();
        assert_eq!(store.in_edges(shared).count(), 2);
    }

    #[tokio::test]
    async fn test_reingesting_seed_duplicates_edges_only() {
        let source = MockAccountSource::new().on_account("alice", 100, &[200, 300]);
        let mut store = GraphStore::new();
        let ingester = FollowIngester::new(&source);

        ingester.ingest_seed(&mut store, "alice").await.unwrap();
        let second = ingester.ingest_seed(&mut store, "alice").await.unwrap();

        assert_eq!(second.vertices_created, 0);
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.edge_count(), 4);

        let seed = store.find_vertex(ExternalId(100)).unwrap();
        let to_200 = store
            .out_edges(seed)
            .filter(|e| store.vertex(e.target).unwrap().external_id == ExternalId(200))
            .count();
        assert_eq!(to_200, 2);
    }

    #[tokio::test]
    async fn test_repeated_id_in_follow_list_is_not_deduplicated() {
        let source = MockAccountSource::new().on_account("alice", 100, &[200, 200]);
        let mut store = GraphStore::new();

        FollowIngester::new(&source)
            .ingest_seed(&mut store, "alice")
            .await
            .unwrap();

        assert_eq!(store.vertex_count(), 2);
        assert_eq!(store.edge_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_seed_is_seed_not_found() {
        let source = MockAccountSource::new();
        let mut store = GraphStore::new();

        let err = FollowIngester::new(&source)
            .ingest_seed(&mut store, "ghost")
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::SeedNotFound { ref screen_name } if screen_name == "ghost"));
        assert_eq!(store.vertex_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_remote_error() {
        let source = MockAccountSource::new()
            .on_account("alice", 100, &[200])
            .fail_lookup(503);
        let mut store = GraphStore::new();

        let err = FollowIngester::new(&source)
            .ingest_seed(&mut store, "alice")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CrawlError::Remote {
                phase: Phase::Ingesting,
                source: SourceError::Remote { status: 503, .. }
            }
        ));
        assert_eq!(store.vertex_count(), 0);
    }

    #[tokio::test]
    async fn test_follow_list_failure_after_lookup() {
        let source = MockAccountSource::new()
            .on_account("alice", 100, &[200])
            .fail_follows(500);
        let mut store = GraphStore::new();

        let err = FollowIngester::new(&source)
            .ingest_seed(&mut store, "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::Remote { phase: Phase::Ingesting, .. }));
        assert_eq!(store.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_seed_following_itself() {
        let source = MockAccountSource::new().on_account("alice", 100, &[100]);
        let mut store = GraphStore::new();

        FollowIngester::new(&source)
            .ingest_seed(&mut store, "alice")
            .await
            .unwrap();

        assert_eq!(store.vertex_count(), 1);
        assert_eq!(store.edge_count(), 1);
    }
}
