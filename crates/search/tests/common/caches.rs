//! Paging caches with scripted behavior.

use std::sync::Arc;

use async_trait::async_trait;

use helios_search::error::{SearchError, SearchResult};
use helios_search::paging::{MatchProvider, PagingCache, RequestContext};

/// What a [`ScriptedCache`] answers to `store`.
#[derive(Debug, Clone)]
pub enum StoreOutcome {
    /// Returns the given id.
    Id(String),
    /// Declines to retain the result set.
    Declined,
    /// Fails with a provider error.
    Fails,
}

/// A paging cache whose `store` answer is fixed up front.
#[derive(Debug)]
pub struct ScriptedCache {
    pub default_page_size: usize,
    pub maximum_page_size: usize,
    pub outcome: StoreOutcome,
}

impl ScriptedCache {
    /// Creates a cache with page sizes 10/100.
    pub fn new(outcome: StoreOutcome) -> Self {
        Self {
            default_page_size: 10,
            maximum_page_size: 100,
            outcome,
        }
    }
}

#[async_trait]
impl PagingCache for ScriptedCache {
    fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    fn maximum_page_size(&self) -> usize {
        self.maximum_page_size
    }

    async fn store(
        &self,
        _request: &RequestContext,
        _provider: Arc<dyn MatchProvider>,
    ) -> SearchResult<Option<String>> {
        match &self.outcome {
            StoreOutcome::Id(id) => Ok(Some(id.clone())),
            StoreOutcome::Declined => Ok(None),
            StoreOutcome::Fails => Err(SearchError::provider("cache unavailable")),
        }
    }

    async fn retrieve(&self, _search_id: &str) -> SearchResult<Option<Arc<dyn MatchProvider>>> {
        Ok(None)
    }
}
