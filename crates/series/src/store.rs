//! Document stores.
//!
//! The cache store proper is an external collaborator behind the
//! `DocumentStore` trait; `MemoryStore` is the in-process implementation
//! used by the CLI and tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use common::{CachedDocument, DocumentStore, Error};

/// Thread-safe in-memory document store keyed by fingerprint.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<String, CachedDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<CachedDocument, Error> {
        self.docs
            .get(id)
            .map(|doc| doc.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn create(&self, mut doc: CachedDocument) -> Result<CachedDocument, Error> {
        let id = doc
            .id
            .clone()
            .ok_or_else(|| Error::Store("document has no _id".into()))?;

        let now = Utc::now();
        doc.created_at = Some(now);
        doc.updated_at = Some(now);

        match self.docs.entry(id) {
            Entry::Occupied(entry) => Err(Error::Store(format!(
                "document {} already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                entry.insert(doc.clone());
                Ok(doc)
            }
        }
    }
}
