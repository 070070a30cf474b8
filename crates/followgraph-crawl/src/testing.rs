// Test doubles for the crawler's two collaborator boundaries:
// - MockAccountSource (AccountSource): map-based accounts, follow lists and
//   profiles, recording every profile batch it is asked for
// - MemorySink (GraphSink): captures the exported graph in memory

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use followgraph_core::{Account, AccountSource, AttributeKey, ExternalId, Profile, SourceError};
use followgraph_graph::{ExportReport, GraphSink, GraphStore, SinkError};

// ---------------------------------------------------------------------------
// MockAccountSource
// ---------------------------------------------------------------------------

/// In-memory account source. Unknown screen names are `NotFound`; profile
/// lookups return only the registered profiles among the requested ids.
/// Builder pattern: `.on_account()`, `.on_profile()`, `.fail_lookup()`,
/// `.fail_follows()`, `.fail_profiles()`.
#[derive(Default)]
pub struct MockAccountSource {
    accounts: HashMap<String, (ExternalId, Vec<ExternalId>)>,
    profiles: HashMap<ExternalId, Profile>,
    /// Profiles returned for every batch regardless of the request.
    unsolicited: Vec<Profile>,
    lookup_failure: Option<SourceError>,
    follows_failure: Option<SourceError>,
    profile_failure: Option<u16>,
    batches: Mutex<Vec<Vec<ExternalId>>>,
}

impl MockAccountSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a screen name, its id, and the ids it follows.
    pub fn on_account(mut self, screen_name: &str, id: u64, follows: &[u64]) -> Self {
        self.accounts.insert(
            screen_name.to_string(),
            (
                ExternalId(id),
                follows.iter().copied().map(ExternalId).collect(),
            ),
        );
        self
    }

    pub fn on_profile(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile.id, profile);
        self
    }

    /// Register a profile with only a `name` attribute.
    pub fn on_named(self, id: u64, name: &str) -> Self {
        self.on_profile(Profile::new(ExternalId(id)).with(AttributeKey::Name, name))
    }

    /// Return `profile` from every batch, whether requested or not.
    pub fn with_unsolicited(mut self, profile: Profile) -> Self {
        self.unsolicited.push(profile);
        self
    }

    /// Make every account lookup fail with the given HTTP status.
    pub fn fail_lookup(mut self, status: u16) -> Self {
        self.lookup_failure = Some(SourceError::Remote {
            status,
            message: "mock failure".to_string(),
        });
        self
    }

    /// Make every follow-list fetch fail with the given HTTP status.
    pub fn fail_follows(mut self, status: u16) -> Self {
        self.follows_failure = Some(SourceError::Remote {
            status,
            message: "mock failure".to_string(),
        });
        self
    }

    /// Make every follow-list fetch report an unreadable response.
    pub fn malformed_follows(mut self) -> Self {
        self.follows_failure = Some(SourceError::Malformed("expected value".to_string()));
        self
    }

    /// Make every profile lookup fail with the given HTTP status.
    pub fn fail_profiles(mut self, status: u16) -> Self {
        self.profile_failure = Some(status);
        self
    }

    /// Every batch passed to `lookup_profiles`, in call order.
    pub fn batches(&self) -> Vec<Vec<ExternalId>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }

    fn account(&self, screen_name: &str) -> Result<&(ExternalId, Vec<ExternalId>), SourceError> {
        self.accounts
            .get(screen_name)
            .ok_or_else(|| SourceError::NotFound {
                screen_name: screen_name.to_string(),
            })
    }
}

#[async_trait]
impl AccountSource for MockAccountSource {
    async fn lookup_account(&self, screen_name: &str) -> Result<Account, SourceError> {
        if let Some(err) = &self.lookup_failure {
            return Err(err.clone());
        }
        let (id, _) = self.account(screen_name)?;
        Ok(Account {
            id: *id,
            screen_name: Some(screen_name.to_string()),
        })
    }

    async fn list_followed_ids(&self, screen_name: &str) -> Result<Vec<ExternalId>, SourceError> {
        let (_, follows) = self.account(screen_name)?;
        if let Some(err) = &self.follows_failure {
            return Err(err.clone());
        }
        Ok(follows.clone())
    }

    async fn lookup_profiles(&self, ids: &[ExternalId]) -> Result<Vec<Profile>, SourceError> {
        self.batches.lock().unwrap().push(ids.to_vec());

        if let Some(status) = self.profile_failure {
            return Err(SourceError::Remote {
                status,
                message: "mock failure".to_string(),
            });
        }

        // Reverse so callers cannot rely on request order.
        let mut found: Vec<Profile> = ids
            .iter()
            .rev()
            .filter_map(|id| self.profiles.get(id).cloned())
            .collect();
        found.extend(self.unsolicited.iter().cloned());
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// A vertex as captured by `MemorySink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedVertex {
    pub external_id: ExternalId,
    pub attributes: Vec<(AttributeKey, String)>,
}

/// A graph as captured by `MemorySink`: vertices, then `(source, target,
/// label)` edges expressed in external ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedGraph {
    pub vertices: Vec<CapturedVertex>,
    pub edges: Vec<(ExternalId, ExternalId, String)>,
}

impl CapturedGraph {
    pub fn vertex(&self, id: u64) -> Option<&CapturedVertex> {
        self.vertices.iter().find(|v| v.external_id == ExternalId(id))
    }

    pub fn edges_from(&self, id: u64) -> Vec<ExternalId> {
        self.edges
            .iter()
            .filter(|(src, _, _)| *src == ExternalId(id))
            .map(|(_, tgt, _)| *tgt)
            .collect()
    }
}

/// Sink that keeps the exported graph in memory.
#[derive(Default)]
pub struct MemorySink {
    captured: Mutex<Option<CapturedGraph>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every export fails.
    pub fn failing() -> Self {
        Self {
            captured: Mutex::new(None),
            fail: true,
        }
    }

    /// The exported graph, if an export succeeded.
    pub fn captured(&self) -> Option<CapturedGraph> {
        self.captured.lock().unwrap().clone()
    }
}

impl GraphSink for MemorySink {
    fn export(&self, store: &GraphStore) -> Result<ExportReport, SinkError> {
        if self.fail {
            return Err(SinkError::Write {
                path: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "sink unavailable"),
            });
        }

        let vertices = store
            .vertices()
            .iter()
            .map(|v| CapturedVertex {
                external_id: v.external_id,
                attributes: v
                    .attributes
                    .iter()
                    .map(|(k, val)| (*k, val.clone()))
                    .collect(),
            })
            .collect();

        let edges = store
            .edges()
            .iter()
            .filter_map(|e| {
                let source = store.vertex(e.source)?.external_id;
                let target = store.vertex(e.target)?.external_id;
                Some((source, target, e.label.to_string()))
            })
            .collect();

        *self.captured.lock().unwrap() = Some(CapturedGraph { vertices, edges });

        Ok(ExportReport {
            destination: "memory".to_string(),
            vertices: store.vertex_count(),
            edges: store.edge_count(),
            bytes: 0,
        })
    }
}
