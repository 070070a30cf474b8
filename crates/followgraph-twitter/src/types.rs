use followgraph_core::{Account, ExternalId, Profile};
use serde::Deserialize;

/// A user object from `users/show` or `users/lookup`.
///
/// Only the fields the crawler copies are decoded; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    pub id: u64,
    pub name: Option<String>,
    pub location: Option<String>,
    pub screen_name: Option<String>,
    pub description: Option<String>,
}

impl TwitterUser {
    pub fn into_account(self) -> Account {
        Account {
            id: ExternalId(self.id),
            screen_name: self.screen_name,
        }
    }

    pub fn into_profile(self) -> Profile {
        Profile {
            id: ExternalId(self.id),
            name: self.name,
            location: self.location,
            screen_name: self.screen_name,
            description: self.description,
        }
    }
}

/// One page of `friends/ids`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdsPage {
    pub ids: Vec<u64>,
    /// `0` marks the last page.
    #[serde(default)]
    pub next_cursor: i64,
}
