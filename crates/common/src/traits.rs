//! Collaborator contracts for the series orchestrator.

use async_trait::async_trait;

use crate::error::Error;
use crate::types::{CacheKeyFields, CachedDocument, FetchOutcome, Interface};

/// The persistence engine backing the document cache. Only the get/create
/// contract is used; eviction and TTL are the store's business.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by fingerprint. A miss is `Error::NotFound`.
    async fn get(&self, id: &str) -> Result<CachedDocument, Error>;

    /// Persist a document that already carries its `_id`.
    async fn create(&self, doc: CachedDocument) -> Result<CachedDocument, Error>;
}

/// The upstream forecast provider.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch and parse a bulletin for the given interface and cache-key
    /// fields. Non-2xx responses come back as `FetchOutcome::Upstream`;
    /// network and parse failures are `Err`.
    async fn find(
        &self,
        interface: Interface,
        fields: &CacheKeyFields,
    ) -> Result<FetchOutcome, Error>;
}
