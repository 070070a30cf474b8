//! The remote account-data capability.
//!
//! Authentication, transport, pagination and rate limiting live behind
//! this trait. Callers see complete, typed results or a `SourceError`.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{Account, ExternalId, Profile};

#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Resolve a screen name to its account id.
    ///
    /// Returns `SourceError::NotFound` when the account does not exist.
    async fn lookup_account(&self, screen_name: &str) -> Result<Account, SourceError>;

    /// Every account id `screen_name` follows, flattened across pages, in
    /// the order the service reports them.
    async fn list_followed_ids(&self, screen_name: &str) -> Result<Vec<ExternalId>, SourceError>;

    /// Profiles for a batch of ids.
    ///
    /// The result order need not match `ids`, and ids whose accounts no
    /// longer exist are simply missing from the result.
    async fn lookup_profiles(&self, ids: &[ExternalId]) -> Result<Vec<Profile>, SourceError>;
}

#[async_trait]
impl<T: AccountSource + ?Sized> AccountSource for &T {
    async fn lookup_account(&self, screen_name: &str) -> Result<Account, SourceError> {
        (**self).lookup_account(screen_name).await
    }

    async fn list_followed_ids(&self, screen_name: &str) -> Result<Vec<ExternalId>, SourceError> {
        (**self).list_followed_ids(screen_name).await
    }

    async fn lookup_profiles(&self, ids: &[ExternalId]) -> Result<Vec<Profile>, SourceError> {
        (**self).lookup_profiles(ids).await
    }
}
