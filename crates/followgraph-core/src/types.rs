//! Core domain types for the follow graph.
//!
//! Remote account data is converted into these typed records at the
//! collaborator boundary; nothing past that boundary sees raw JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identity ──────────────────────────────────────────────────────

/// Numeric account identifier assigned by the remote account service.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct ExternalId(pub u64);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ExternalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque reference to a vertex inside a single graph store.
///
/// Handles are dense and assigned in creation order. They are never
/// reused because vertices are never removed during a run. Each handle
/// carries the id of the store that issued it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexHandle {
    store: u64,
    index: usize,
}

impl VertexHandle {
    /// Build a handle for position `index` in store `store`. Only graph
    /// stores should need this.
    pub fn new(store: u64, index: usize) -> Self {
        Self { store, index }
    }

    /// Id of the store that issued this handle.
    pub fn store(self) -> u64 {
        self.store
    }

    /// Dense position of the vertex in its store.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for VertexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}

// ── Attributes ────────────────────────────────────────────────────

/// The closed set of profile attributes copied onto account vertices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    Name,
    Location,
    ScreenName,
    Description,
}

impl AttributeKey {
    /// Every recognized key, in export order.
    pub const ALL: [AttributeKey; 4] = [
        AttributeKey::Name,
        AttributeKey::Location,
        AttributeKey::ScreenName,
        AttributeKey::Description,
    ];

    /// Property name used on the wire and in exported documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::ScreenName => "screen_name",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Edges ─────────────────────────────────────────────────────────

/// Relationship label between two account vertices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeLabel {
    /// Source account follows target account.
    Follows,
}

impl EdgeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Follows => "follows",
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Remote records ────────────────────────────────────────────────

/// Result of resolving a screen name to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: ExternalId,
    pub screen_name: Option<String>,
}

/// A partial profile returned by a batched lookup.
///
/// `None` means the remote service returned null or omitted the field.
/// An empty string is a real value and is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub id: ExternalId,
    pub name: Option<String>,
    pub location: Option<String>,
    pub screen_name: Option<String>,
    pub description: Option<String>,
}

impl Profile {
    pub fn new(id: ExternalId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Value for a recognized attribute, if the remote service supplied one.
    pub fn attribute(&self, key: AttributeKey) -> Option<&str> {
        match key {
            AttributeKey::Name => self.name.as_deref(),
            AttributeKey::Location => self.location.as_deref(),
            AttributeKey::ScreenName => self.screen_name.as_deref(),
            AttributeKey::Description => self.description.as_deref(),
        }
    }

    /// Builder-style setter used by fakes and fixtures.
    pub fn with(mut self, key: AttributeKey, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match key {
            AttributeKey::Name => self.name = value,
            AttributeKey::Location => self.location = value,
            AttributeKey::ScreenName => self.screen_name = value,
            AttributeKey::Description => self.description = value,
        }
        self
    }

    /// Present attributes, in `AttributeKey::ALL` order.
    pub fn present_attributes(&self) -> impl Iterator<Item = (AttributeKey, &str)> {
        AttributeKey::ALL
            .into_iter()
            .filter_map(move |key| self.attribute(key).map(|value| (key, value)))
    }
}
