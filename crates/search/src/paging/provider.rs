//! Match providers and the paging cache.
//!
//! A [`MatchProvider`] is the storage engine's answer to a compiled query: a
//! lazily fetchable, possibly size-unknown list of matches. A [`PagingCache`]
//! retains providers under a search id so later page requests can resume them.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::error::SearchResult;
use crate::partition::RequestPartition;

/// The request a result set was produced for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Base URL of the server (e.g. `http://example.com/fhir`).
    pub server_base: String,

    /// Path of the request relative to the base (e.g. `Patient`).
    pub request_path: String,

    /// Query parameters in request order.
    pub parameters: Vec<(String, String)>,

    /// The partition the request is scoped to.
    pub partition: Option<RequestPartition>,
}

impl RequestContext {
    /// Creates a request context.
    pub fn new(server_base: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            server_base: server_base.into(),
            request_path: request_path.into(),
            ..Default::default()
        }
    }

    /// Adds a query parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Scopes the request to a partition.
    pub fn with_partition(mut self, partition: RequestPartition) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// A lazily fetchable set of matches.
///
/// Resource order is fixed by the provider; callers never re-sort.
#[async_trait]
pub trait MatchProvider: Send + Sync + Debug {
    /// Opaque identifier of the result set.
    fn uuid(&self) -> Option<String>;

    /// Total number of matches, if known. May become known after fetching.
    fn size(&self) -> Option<usize>;

    /// Id of the current page, when the provider pages by itself.
    fn current_page_id(&self) -> Option<String> {
        None
    }

    /// Id of the next page, when the provider pages by itself.
    fn next_page_id(&self) -> Option<String> {
        None
    }

    /// Id of the previous page, when the provider pages by itself.
    fn previous_page_id(&self) -> Option<String> {
        None
    }

    /// Offset of the window the provider already applied, if any.
    fn current_page_offset(&self) -> Option<usize> {
        None
    }

    /// Fetches the matches in `[from, to)`.
    ///
    /// Entries may be `None` when a match disappeared after the result set was
    /// built (for example, purged data). Positions past the end are not returned.
    async fn resources(&self, from: usize, to: usize) -> SearchResult<Vec<Option<Value>>>;
}

/// Retains match providers for cursor paging.
#[async_trait]
pub trait PagingCache: Send + Sync + Debug {
    /// Page size used when the caller does not ask for one.
    fn default_page_size(&self) -> usize;

    /// Largest page size the cache will serve.
    fn maximum_page_size(&self) -> usize;

    /// Retains a provider and returns the search id it can be resumed by.
    ///
    /// `Ok(None)` means the cache declined to retain it.
    async fn store(
        &self,
        request: &RequestContext,
        provider: Arc<dyn MatchProvider>,
    ) -> SearchResult<Option<String>>;

    /// Looks up a retained provider.
    async fn retrieve(&self, search_id: &str) -> SearchResult<Option<Arc<dyn MatchProvider>>>;
}

/// A match provider over an in-memory list.
///
/// # Examples
///
/// ```
/// use helios_search::paging::{ListMatchProvider, MatchProvider};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = ListMatchProvider::new(vec![
///     json!({"resourceType": "Patient", "id": "a"}),
///     json!({"resourceType": "Patient", "id": "b"}),
/// ]);
/// assert_eq!(provider.size(), Some(2));
/// let page = provider.resources(1, 10).await.unwrap();
/// assert_eq!(page.len(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct ListMatchProvider {
    uuid: Option<String>,
    resources: Vec<Option<Value>>,
    known_size: RwLock<Option<usize>>,
    current_page_id: Option<String>,
    next_page_id: Option<String>,
    previous_page_id: Option<String>,
    current_page_offset: Option<usize>,
}

impl ListMatchProvider {
    /// Creates a provider whose size is known up front.
    pub fn new(resources: Vec<Value>) -> Self {
        Self::from_entries(resources.into_iter().map(Some).collect())
    }

    /// Creates a provider from entries that may contain gaps.
    pub fn from_entries(resources: Vec<Option<Value>>) -> Self {
        let size = resources.len();
        Self {
            uuid: Some(Uuid::new_v4().to_string()),
            resources,
            known_size: RwLock::new(Some(size)),
            current_page_id: None,
            next_page_id: None,
            previous_page_id: None,
            current_page_offset: None,
        }
    }

    /// Hides the size until a fetch reaches the end of the list.
    pub fn with_unknown_size(self) -> Self {
        *self.known_size.write() = None;
        self
    }

    /// Sets the result set identifier.
    pub fn with_uuid(mut self, uuid: Option<String>) -> Self {
        self.uuid = uuid;
        self
    }

    /// Sets provider-managed page ids.
    pub fn with_page_ids(
        mut self,
        current: impl Into<String>,
        next: Option<String>,
        previous: Option<String>,
    ) -> Self {
        self.current_page_id = Some(current.into());
        self.next_page_id = next;
        self.previous_page_id = previous;
        self
    }

    /// Marks the list as already windowed at `offset`.
    pub fn with_page_offset(mut self, offset: usize) -> Self {
        self.current_page_offset = Some(offset);
        self
    }
}

#[async_trait]
impl MatchProvider for ListMatchProvider {
    fn uuid(&self) -> Option<String> {
        self.uuid.clone()
    }

    fn size(&self) -> Option<usize> {
        *self.known_size.read()
    }

    fn current_page_id(&self) -> Option<String> {
        self.current_page_id.clone()
    }

    fn next_page_id(&self) -> Option<String> {
        self.next_page_id.clone()
    }

    fn previous_page_id(&self) -> Option<String> {
        self.previous_page_id.clone()
    }

    fn current_page_offset(&self) -> Option<usize> {
        self.current_page_offset
    }

    async fn resources(&self, from: usize, to: usize) -> SearchResult<Vec<Option<Value>>> {
        let len = self.resources.len();
        let start = from.min(len);
        let end = to.clamp(start, len);

        if end == len {
            let mut known = self.known_size.write();
            if known.is_none() {
                *known = Some(len);
            }
        }

        Ok(self.resources[start..end].to_vec())
    }
}

/// An in-memory paging cache keyed by random UUID search ids.
#[derive(Debug)]
pub struct InMemoryPagingCache {
    default_page_size: usize,
    maximum_page_size: usize,
    entries: RwLock<HashMap<String, Arc<dyn MatchProvider>>>,
}

impl InMemoryPagingCache {
    /// Creates an empty cache with the given page sizes.
    pub fn new(default_page_size: usize, maximum_page_size: usize) -> Self {
        Self {
            default_page_size,
            maximum_page_size,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an empty cache sized from the configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.default_page_size().unwrap_or(config.max_page_size),
            config.max_page_size,
        )
    }

    /// Returns the number of retained result sets.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops a retained result set.
    pub fn evict(&self, search_id: &str) -> bool {
        self.entries.write().remove(search_id).is_some()
    }
}

#[async_trait]
impl PagingCache for InMemoryPagingCache {
    fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    fn maximum_page_size(&self) -> usize {
        self.maximum_page_size
    }

    async fn store(
        &self,
        request: &RequestContext,
        provider: Arc<dyn MatchProvider>,
    ) -> SearchResult<Option<String>> {
        let search_id = Uuid::new_v4().to_string();
        tracing::debug!(
            search_id = %search_id,
            path = %request.request_path,
            "Retained result set"
        );
        self.entries.write().insert(search_id.clone(), provider);
        Ok(Some(search_id))
    }

    async fn retrieve(&self, search_id: &str) -> SearchResult<Option<Arc<dyn MatchProvider>>> {
        Ok(self.entries.read().get(search_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patients(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"resourceType": "Patient", "id": format!("p{}", i)}))
            .collect()
    }

    #[tokio::test]
    async fn test_list_provider_clamps_window() {
        let provider = ListMatchProvider::new(patients(5));
        assert_eq!(provider.resources(3, 100).await.unwrap().len(), 2);
        assert!(provider.resources(10, 20).await.unwrap().is_empty());
        assert!(provider.resources(4, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_size_revealed_at_end() {
        let provider = ListMatchProvider::new(patients(5)).with_unknown_size();
        assert_eq!(provider.size(), None);
        provider.resources(0, 3).await.unwrap();
        assert_eq!(provider.size(), None);
        provider.resources(3, 6).await.unwrap();
        assert_eq!(provider.size(), Some(5));
    }

    #[tokio::test]
    async fn test_cache_store_and_retrieve() {
        let cache = InMemoryPagingCache::new(10, 100);
        let provider: Arc<dyn MatchProvider> = Arc::new(ListMatchProvider::new(patients(3)));
        let id = cache
            .store(&RequestContext::new("http://x/fhir", "Patient"), provider)
            .await
            .unwrap()
            .unwrap();

        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(cache.len(), 1);
        let found = cache.retrieve(&id).await.unwrap().unwrap();
        assert_eq!(found.size(), Some(3));

        assert!(cache.evict(&id));
        assert!(cache.retrieve(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_concurrent_stores() {
        let cache = Arc::new(InMemoryPagingCache::new(10, 100));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let provider: Arc<dyn MatchProvider> =
                    Arc::new(ListMatchProvider::new(patients(2)));
                cache
                    .store(&RequestContext::default(), provider)
                    .await
                    .unwrap()
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
