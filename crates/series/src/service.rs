//! High-level service to retrieve NDFD forecast series.
//!
//! Fingerprints the cache-relevant query fields, serializes concurrent
//! identical requests through a per-fingerprint queue, resolves the document
//! from the cache store or the upstream fetcher, and shapes the extracted
//! series for the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::config::PaginateConfig;
use common::{
    CacheKeyFields, CachedDocument, DocumentFetcher, DocumentStore, ErrorPayload, FetchOutcome,
    Interface, ParameterQuery, ParameterRecord, SeriesItem, SeriesQuery,
};

use crate::compact::{compact_series, CompactItem};
use crate::fingerprint::fingerprint;
use crate::queue::{QueueRegistry, TaskFuture};

type TaskOutcome = Result<CachedDocument, ErrorPayload>;

/// Response data, full or compact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesData {
    Full(Vec<SeriesItem>),
    Compact(Vec<CompactItem>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Full(items) => items.len(),
            SeriesData::Compact(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `find` result. Failures degrade to an `error` payload instead of
/// propagating, so batch callers degrade per-item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub limit: usize,
    pub data: SeriesData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl SeriesResponse {
    fn degraded(limit: usize, payload: ErrorPayload) -> Self {
        Self {
            limit,
            data: SeriesData::Full(Vec::new()),
            error: Some(payload),
        }
    }
}

/// Series orchestrator over an injected store and fetcher.
pub struct SeriesService {
    store: Arc<dyn DocumentStore>,
    fetcher: Arc<dyn DocumentFetcher>,
    queues: QueueRegistry<TaskOutcome>,
    paginate: PaginateConfig,
}

impl SeriesService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn DocumentFetcher>,
        paginate: PaginateConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            queues: QueueRegistry::new(),
            paginate,
        }
    }

    /// Resolve a series query end to end.
    pub async fn find(&self, query: SeriesQuery) -> SeriesResponse {
        let limit = self.effective_limit(query.limit);
        let compact = query.compact.unwrap_or(false);
        let sort = query.sort.as_ref().and_then(|s| s.time);

        let fields = CacheKeyFields::from_query(&query);
        let id = fingerprint(&fields);

        let task = self.fetch_or_cache(id.clone(), fields, query.interface);
        let doc = match self.queues.run(&id, task).await {
            Ok(Ok(doc)) => doc,
            Ok(Err(payload)) => return SeriesResponse::degraded(limit, payload),
            Err(err) => return SeriesResponse::degraded(limit, ErrorPayload::from(err)),
        };

        let mut items: Vec<SeriesItem> =
            select_parameter(&doc.parameters, query.parameter.as_ref())
                .map(|p| p.series.clone())
                .unwrap_or_default();

        match sort {
            Some(-1) => items.sort_by_key(|item| std::cmp::Reverse(item.start_instant())),
            Some(1) => items.sort_by_key(|item| item.start_instant()),
            _ => {}
        }
        items.truncate(limit);

        let data = if compact {
            SeriesData::Compact(compact_series(items).await)
        } else {
            SeriesData::Full(items)
        };

        SeriesResponse {
            limit,
            data,
            error: None,
        }
    }

    fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.paginate.default_limit)
            .min(self.paginate.max_limit)
    }

    /// The queued task: look up the fingerprint in the cache store, fall
    /// back to the fetcher on a miss, and persist fresh documents that carry
    /// at least one parameter.
    fn fetch_or_cache(
        &self,
        id: String,
        fields: CacheKeyFields,
        interface: Option<Interface>,
    ) -> TaskFuture<TaskOutcome> {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);

        Box::pin(async move {
            match store.get(&id).await {
                Ok(doc) => {
                    debug!("cache hit for {}", id);
                    return Ok(doc);
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    warn!("cache store get failed for {}: {}", id, err);
                    return Err(ErrorPayload::from(err));
                }
            }

            let Some(interface) = interface else {
                return Err(ErrorPayload::new(
                    "interface is required to fetch an uncached document",
                ));
            };

            let outcome = match fetcher.find(interface, &fields).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("upstream fetch failed for {}: {}", id, err);
                    return Err(ErrorPayload::from(err));
                }
            };

            match outcome {
                FetchOutcome::Document(mut doc) => {
                    if doc.parameters.is_empty() {
                        debug!("document for {} has no parameters; not caching", id);
                        return Ok(doc);
                    }

                    doc.id = Some(id.clone());
                    match store.create(doc).await {
                        Ok(stored) => Ok(stored),
                        Err(err) => {
                            warn!("caching document {} failed: {}", id, err);
                            Err(ErrorPayload::from(err))
                        }
                    }
                }
                FetchOutcome::Upstream {
                    request,
                    status,
                    body,
                } => Err(ErrorPayload {
                    message: body,
                    status: Some(status),
                    request_options: Some(request),
                }),
            }
        })
    }
}

/// First matching parameter in document order: exact name match when a name
/// is given, otherwise key-path prefix match.
fn select_parameter<'a>(
    parameters: &'a [ParameterRecord],
    selector: Option<&ParameterQuery>,
) -> Option<&'a ParameterRecord> {
    let selector = selector?;

    if let Some(name) = selector.name.as_deref() {
        return parameters.iter().find(|p| p.name.as_deref() == Some(name));
    }
    if let Some(prefix) = selector.key_path.as_deref() {
        return parameters.iter().find(|p| p.key_path.starts_with(prefix));
    }

    None
}
