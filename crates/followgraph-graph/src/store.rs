//! In-memory directed multigraph of accounts and `follows` edges.
//!
//! Vertices live in a dense vector indexed by `VertexHandle`; edges are
//! appended to a flat list with per-vertex adjacency lists of edge indices
//! for both directions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use followgraph_core::{AttributeKey, EdgeLabel, ExternalId, VertexHandle};

/// Errors from graph store operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexHandle),

    #[error("Vertex handle {handle} was issued by store {owner}, not store {store}")]
    ForeignHandle {
        handle: VertexHandle,
        owner: u64,
        store: u64,
    },

    #[error("Invalid edge endpoint {handle}: store has {vertex_count} vertices")]
    InvalidHandle {
        handle: VertexHandle,
        vertex_count: usize,
    },
}

/// An account vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub handle: VertexHandle,
    /// Remote account id. Immutable and unique within the store.
    pub external_id: ExternalId,
    /// Only keys the remote service returned a non-null value for.
    pub attributes: BTreeMap<AttributeKey, String>,
}

/// A directed, labeled edge between two vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Dense edge index in insertion order.
    pub index: usize,
    pub source: VertexHandle,
    pub target: VertexHandle,
    pub label: EdgeLabel,
}

/// Map from external account id to the vertex that owns it.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    by_external_id: HashMap<ExternalId, VertexHandle>,
}

impl IdentityIndex {
    pub fn get(&self, id: ExternalId) -> Option<VertexHandle> {
        self.by_external_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_external_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_external_id.is_empty()
    }

    fn insert(&mut self, id: ExternalId, handle: VertexHandle) {
        self.by_external_id.insert(id, handle);
    }
}

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// The follow graph built during one crawl.
///
/// Not synchronized: a store has exactly one writer at a time.
#[derive(Debug)]
pub struct GraphStore {
    id: u64,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    /// `outgoing[i]` = indices into `edges` whose source is vertex `i`.
    outgoing: Vec<Vec<usize>>,
    /// `incoming[i]` = indices into `edges` whose target is vertex `i`.
    incoming: Vec<Vec<usize>>,
    index: IdentityIndex,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            vertices: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            index: IdentityIndex::default(),
        }
    }

    /// Process-unique id stamped into every handle this store issues.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Return the vertex for `id`, creating it with no attributes if this
    /// is the first time the id has been seen.
    pub fn get_or_create_vertex(&mut self, id: ExternalId) -> VertexHandle {
        if let Some(handle) = self.index.get(id) {
            return handle;
        }

        let handle = VertexHandle::new(self.id, self.vertices.len());
        self.vertices.push(Vertex {
            handle,
            external_id: id,
            attributes: BTreeMap::new(),
        });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.index.insert(id, handle);

        tracing::trace!(external_id = %id, %handle, "Vertex created");
        handle
    }

    /// Append a directed edge. Parallel edges are allowed.
    pub fn add_edge(
        &mut self,
        source: VertexHandle,
        target: VertexHandle,
        label: EdgeLabel,
    ) -> Result<usize, GraphError> {
        self.check_handle(source)?;
        self.check_handle(target)?;

        let index = self.edges.len();
        self.edges.push(Edge {
            index,
            source,
            target,
            label,
        });
        self.outgoing[source.index()].push(index);
        self.incoming[target.index()].push(index);
        Ok(index)
    }

    /// Overwrite one attribute on an existing vertex.
    pub fn set_attribute(
        &mut self,
        handle: VertexHandle,
        key: AttributeKey,
        value: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.check_owner(handle)?;
        let vertex = self
            .vertices
            .get_mut(handle.index())
            .ok_or(GraphError::VertexNotFound(handle))?;
        vertex.attributes.insert(key, value.into());
        Ok(())
    }

    /// Snapshot of every external id, in vertex creation order.
    pub fn vertex_ids(&self) -> Vec<ExternalId> {
        self.vertices.iter().map(|v| v.external_id).collect()
    }

    /// Look up an existing vertex without creating one.
    pub fn find_vertex(&self, id: ExternalId) -> Option<VertexHandle> {
        self.index.get(id)
    }

    pub fn vertex(&self, handle: VertexHandle) -> Option<&Vertex> {
        if handle.store() != self.id {
            return None;
        }
        self.vertices.get(handle.index())
    }

    /// All vertices in creation order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of a vertex, in insertion order.
    pub fn out_edges(&self, handle: VertexHandle) -> impl Iterator<Item = &Edge> {
        self.adjacent(&self.outgoing, handle)
    }

    /// Incoming edges of a vertex, in insertion order.
    pub fn in_edges(&self, handle: VertexHandle) -> impl Iterator<Item = &Edge> {
        self.adjacent(&self.incoming, handle)
    }

    pub fn identity_index(&self) -> &IdentityIndex {
        &self.index
    }

    /// Number of vertices in the graph.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn adjacent<'a>(
        &'a self,
        lists: &'a [Vec<usize>],
        handle: VertexHandle,
    ) -> impl Iterator<Item = &'a Edge> {
        lists
            .get(handle.index())
            .filter(|_| handle.store() == self.id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    fn check_owner(&self, handle: VertexHandle) -> Result<(), GraphError> {
        if handle.store() == self.id {
            Ok(())
        } else {
            Err(GraphError::ForeignHandle {
                handle,
                owner: handle.store(),
                store: self.id,
            })
        }
    }

    fn check_handle(&self, handle: VertexHandle) -> Result<(), GraphError> {
        self.check_owner(handle)?;
        if handle.index() < self.vertices.len() {
            Ok(())
        } else {
            Err(GraphError::InvalidHandle {
                handle,
                vertex_count: self.vertices.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_returns_same_handle() {
        let mut store = GraphStore::new();
        let first = store.get_or_create_vertex(ExternalId(100));
        let second = store.get_or_create_vertex(ExternalId(100));

        assert_eq!(first, second);
        assert_eq!(store.vertex_count(), 1);
    }

    #[test]
    fn test_distinct_ids_create_distinct_vertices() {
        let mut store = GraphStore::new();
        let sequence = [5, 3, 5, 9, 3, 3, 1, 9, 5, 7];

        for id in sequence {
            store.get_or_create_vertex(ExternalId(id));
        }

        assert_eq!(store.vertex_count(), 5);
        assert_eq!(store.identity_index().len(), 5);
        assert_eq!(
            store.vertex_ids(),
            vec![ExternalId(5), ExternalId(3), ExternalId(9), ExternalId(1), ExternalId(7)]
        );
    }

    #[test]
    fn test_handles_follow_creation_order() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_vertex(ExternalId(42));
        let b = store.get_or_create_vertex(ExternalId(7));

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(store.find_vertex(ExternalId(7)), Some(b));
        assert_eq!(store.find_vertex(ExternalId(8)), None);
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_vertex(ExternalId(1));
        let b = store.get_or_create_vertex(ExternalId(2));

        store.add_edge(a, b, EdgeLabel::Follows).unwrap();
        store.add_edge(a, b, EdgeLabel::Follows).unwrap();

        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.out_edges(a).count(), 2);
        assert_eq!(store.in_edges(b).count(), 2);
        assert_eq!(store.out_edges(b).count(), 0);
    }

    #[test]
    fn test_add_edge_rejects_out_of_range_handle() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_vertex(ExternalId(1));
        let beyond = VertexHandle::new(store.id(), 5);

        let err = store.add_edge(a, beyond, EdgeLabel::Follows).unwrap_err();
        assert!(matches!(err, GraphError::InvalidHandle { vertex_count: 1, .. }));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_rejects_in_range_handle_from_other_store() {
        let mut other = GraphStore::new();
        let foreign = other.get_or_create_vertex(ExternalId(2));

        let mut store = GraphStore::new();
        let a = store.get_or_create_vertex(ExternalId(1));
        let b = store.get_or_create_vertex(ExternalId(2));
        store.get_or_create_vertex(ExternalId(3));
        assert_eq!(foreign.index(), 0);

        let err = store.add_edge(a, foreign, EdgeLabel::Follows).unwrap_err();
        assert!(matches!(err, GraphError::ForeignHandle { .. }));
        let err = store.add_edge(foreign, b, EdgeLabel::Follows).unwrap_err();
        assert!(matches!(err, GraphError::ForeignHandle { .. }));
        assert_eq!(store.edge_count(), 0);
        assert!(store.vertex(foreign).is_none());
        assert_eq!(store.out_edges(foreign).count(), 0);
    }

    #[test]
    fn test_set_attribute_rejects_handle_from_other_store() {
        let mut other = GraphStore::new();
        let foreign = other.get_or_create_vertex(ExternalId(9));

        let mut store = GraphStore::new();
        let own = store.get_or_create_vertex(ExternalId(1));

        let result = store.set_attribute(foreign, AttributeKey::Name, "x");
        assert!(matches!(result, Err(GraphError::ForeignHandle { .. })));
        assert!(store.vertex(own).unwrap().attributes.is_empty());
    }

    #[test]
    fn test_set_attribute_overwrites() {
        let mut store = GraphStore::new();
        let v = store.get_or_create_vertex(ExternalId(300));

        store.set_attribute(v, AttributeKey::Name, "Alice").unwrap();
        store.set_attribute(v, AttributeKey::Name, "Alice B.").unwrap();

        let vertex = store.vertex(v).unwrap();
        assert_eq!(vertex.attributes.len(), 1);
        assert_eq!(vertex.attributes[&AttributeKey::Name], "Alice B.");
    }

    #[test]
    fn test_set_attribute_on_stale_handle() {
        let mut store = GraphStore::new();
        let result = store.set_attribute(VertexHandle::new(store.id(), 3), AttributeKey::Name, "x");
        assert!(matches!(result, Err(GraphError::VertexNotFound(_))));
    }
}
