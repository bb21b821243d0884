//! Result page assembly.
//!
//! [`ResponseBundleBuilder`] turns a [`MatchProvider`] into one page of
//! resources under either paging mode:
//!
//! - **Offset**: an explicit `_offset` was requested, the server does not
//!   retain results, or a history request is configured for offset paging.
//!   Every page is computed from the absolute offset alone.
//! - **Cursor**: otherwise. The provider is retained by the [`PagingCache`]
//!   under a search id that later pages resume.
//!
//! The assembled page has null entries stripped and every resource checked for
//! an id before links and the bundle are built.

use std::sync::Arc;

use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};
use crate::paging::links::build_links;
use crate::paging::provider::{MatchProvider, PagingCache, RequestContext};
use crate::types::{
    BundleEntry, BundleLinks, BundleType, PageDescriptor, PagingMode, RequestedPage,
    ResponsePage, SearchBundle,
};

const OPERATION_OUTCOME: &str = "OperationOutcome";

/// Everything needed to assemble one page.
#[derive(Debug, Clone)]
pub struct ResponseBundleRequest {
    /// The result set to page through.
    pub provider: Arc<dyn MatchProvider>,

    /// The request the page answers.
    pub context: RequestContext,

    /// The explicit `_offset`/`_count` window, if any.
    pub requested_page: RequestedPage,

    /// Cursor position: the retained search id, page id, offset and page size.
    pub page: PageDescriptor,

    /// Search or history.
    pub bundle_type: BundleType,

    /// The fully qualified URL of this request.
    pub link_self: String,
}

impl ResponseBundleRequest {
    /// Creates a request for the first page of a new search.
    pub fn new(
        provider: Arc<dyn MatchProvider>,
        context: RequestContext,
        link_self: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            context,
            requested_page: RequestedPage::default(),
            page: PageDescriptor::default(),
            bundle_type: BundleType::Searchset,
            link_self: link_self.into(),
        }
    }

    /// Sets the explicit paging window.
    pub fn with_requested_page(mut self, requested_page: RequestedPage) -> Self {
        self.requested_page = requested_page;
        self
    }

    /// Sets the cursor position.
    pub fn with_page(mut self, page: PageDescriptor) -> Self {
        self.page = page;
        self
    }

    /// Sets the bundle type.
    pub fn with_bundle_type(mut self, bundle_type: BundleType) -> Self {
        self.bundle_type = bundle_type;
        self
    }

    /// Returns the cursor offset.
    pub fn offset(&self) -> usize {
        self.page.offset
    }
}

/// Assembles result pages, links and bundles.
#[derive(Debug, Clone)]
pub struct ResponseBundleBuilder {
    config: SearchConfig,
    cache: Option<Arc<dyn PagingCache>>,
}

/// The paging mode with the collaborator it needs.
enum Mode<'a> {
    Offset,
    Cursor(&'a dyn PagingCache),
}

impl ResponseBundleBuilder {
    /// Creates a builder. Without a cache every request is paged by offset.
    pub fn new(config: SearchConfig, cache: Option<Arc<dyn PagingCache>>) -> Self {
        Self { config, cache }
    }

    /// Returns true if result sets can be retained for cursor paging.
    pub fn can_store_search_results(&self) -> bool {
        self.retaining_cache().is_some()
    }

    fn retaining_cache(&self) -> Option<&dyn PagingCache> {
        self.cache
            .as_deref()
            .filter(|_| self.config.store_search_results)
    }

    /// Rebuilds the request for a later page of a retained result set.
    ///
    /// Returns `Ok(None)` when the result set is no longer retained, or when
    /// the descriptor names a page id other than the one the retained
    /// provider holds.
    pub async fn resume(
        &self,
        page: PageDescriptor,
        context: RequestContext,
        link_self: impl Into<String>,
    ) -> SearchResult<Option<ResponseBundleRequest>> {
        let Some(search_id) = page.search_id.as_deref() else {
            return Err(SearchError::invalid("resuming a page requires a search id"));
        };
        let Some(cache) = self.retaining_cache() else {
            return Ok(None);
        };
        let Some(provider) = cache.retrieve(search_id).await? else {
            tracing::debug!(search_id, "Retained result set not found");
            return Ok(None);
        };
        if let Some(page_id) = page.page_id.as_deref() {
            if provider.current_page_id().as_deref() != Some(page_id) {
                tracing::debug!(search_id, page_id, "Requested page is not retained");
                return Ok(None);
            }
        }

        Ok(Some(
            ResponseBundleRequest::new(provider, context, link_self).with_page(page),
        ))
    }

    /// Returns true if this request is a history request paged by offset.
    fn is_offset_mode_history(&self, request: &ResponseBundleRequest) -> bool {
        self.config.offset_mode_history && request.bundle_type == BundleType::History
    }

    fn mode(&self, request: &ResponseBundleRequest) -> Mode<'_> {
        match self.retaining_cache() {
            Some(cache)
                if request.requested_page.offset.is_none()
                    && !self.is_offset_mode_history(request) =>
            {
                Mode::Cursor(cache)
            }
            _ => Mode::Offset,
        }
    }

    /// Returns the paging mode this request will be served under.
    pub fn paging_mode(&self, request: &ResponseBundleRequest) -> PagingMode {
        match self.mode(request) {
            Mode::Offset => PagingMode::Offset,
            Mode::Cursor(_) => PagingMode::Cursor,
        }
    }

    /// Assembles the page of resources for a request.
    ///
    /// Null entries are dropped. A resource without an id that is not an
    /// `OperationOutcome` fails the request with [`SearchError::DataIntegrity`].
    pub async fn build_response_page(
        &self,
        request: &ResponseBundleRequest,
    ) -> SearchResult<ResponsePage> {
        let mut page = match self.mode(request) {
            Mode::Offset => self.build_offset_page(request).await?,
            Mode::Cursor(cache) => self.build_cursor_page(request, cache).await?,
        };
        page.num_total_results = request.provider.size();
        validate_ids(&page.resources)?;
        Ok(page)
    }

    async fn build_offset_page(&self, request: &ResponseBundleRequest) -> SearchResult<ResponsePage> {
        let provider = &request.provider;
        let page_size = self.offset_page_size(request.requested_page, provider.size());
        let num_to_return = page_size;

        let window = if provider.current_page_offset().is_some() {
            // The provider windowed the results itself
            Some((0, provider.size().unwrap_or(usize::MAX)))
        } else if num_to_return == 0 {
            None
        } else if self.is_offset_mode_history(request) {
            Some((0, num_to_return))
        } else {
            let offset = request.requested_page.offset.unwrap_or(0);
            Some((offset, offset.saturating_add(num_to_return)))
        };

        let resources = match window {
            Some((from, to)) => fetch(provider.as_ref(), from, to).await?,
            None => Vec::new(),
        };

        Ok(ResponsePage {
            mode: PagingMode::Offset,
            search_id: None,
            resources,
            page_size,
            num_to_return,
            num_total_results: None,
        })
    }

    fn offset_page_size(&self, requested: RequestedPage, total: Option<usize>) -> usize {
        requested
            .limit
            .or_else(|| self.config.default_page_size())
            .or(total)
            .unwrap_or(usize::MAX)
    }

    async fn build_cursor_page(
        &self,
        request: &ResponseBundleRequest,
        cache: &dyn PagingCache,
    ) -> SearchResult<ResponsePage> {
        let provider = &request.provider;
        let offset = request.offset();
        let page_size = match request.requested_page.limit.or(request.page.limit) {
            None | Some(0) => cache.default_page_size(),
            Some(limit) => cache.maximum_page_size().min(limit),
        };

        let num_to_return = match provider.size() {
            None => page_size,
            Some(total) => page_size.min(total.saturating_sub(offset)),
        };

        let resources = if num_to_return > 0 || provider.current_page_id().is_some() {
            fetch(
                provider.as_ref(),
                offset,
                offset.saturating_add(num_to_return),
            )
            .await?
        } else {
            Vec::new()
        };

        let search_id = self
            .cursor_search_id(request, cache, num_to_return, provider.size())
            .await;

        Ok(ResponsePage {
            mode: PagingMode::Cursor,
            search_id,
            resources,
            page_size,
            num_to_return,
            num_total_results: None,
        })
    }

    async fn cursor_search_id(
        &self,
        request: &ResponseBundleRequest,
        cache: &dyn PagingCache,
        num_to_return: usize,
        total: Option<usize>,
    ) -> Option<String> {
        if let Some(search_id) = &request.page.search_id {
            return Some(search_id.clone());
        }
        if total.is_some_and(|total| total <= num_to_return) {
            return None;
        }

        match cache
            .store(&request.context, Arc::clone(&request.provider))
            .await
        {
            Ok(Some(search_id)) if !search_id.trim().is_empty() => Some(search_id),
            Ok(_) => {
                tracing::info!(
                    total = ?total,
                    "Found results but paging cache did not provide an ID to use for paging"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Paging cache failed to retain results, returning a single page"
                );
                None
            }
        }
    }

    /// Builds the navigation links for an assembled page.
    pub fn build_links(&self, request: &ResponseBundleRequest, page: &ResponsePage) -> BundleLinks {
        build_links(request, page)
    }

    /// Assembles the page, its links and the resulting bundle.
    pub async fn build_response_bundle(
        &self,
        request: &ResponseBundleRequest,
    ) -> SearchResult<SearchBundle> {
        let page = self.build_response_page(request).await?;
        let links = self.build_links(request, &page);

        let mut bundle = SearchBundle::new(request.bundle_type).with_links(&links);
        if let Some(id) = request.provider.uuid().or_else(|| page.search_id.clone()) {
            bundle = bundle.with_id(id);
        }
        if let Some(total) = page.num_total_results {
            bundle = bundle.with_total(total as u64);
        }

        let base = links.server_base.trim_end_matches('/');
        for resource in page.resources {
            let entry = if resource_type(&resource) == Some(OPERATION_OUTCOME) {
                BundleEntry::outcome_entry(resource)
            } else {
                let full_url = match (resource_type(&resource), resource_id(&resource)) {
                    (Some(rt), Some(id)) => Some(format!("{}/{}/{}", base, rt, id)),
                    _ => None,
                };
                BundleEntry::match_entry(full_url, resource)
            };
            bundle = bundle.with_entry(entry);
        }

        Ok(bundle)
    }
}

async fn fetch(provider: &dyn MatchProvider, from: usize, to: usize) -> SearchResult<Vec<Value>> {
    tracing::debug!(from, to, "Fetching result window");
    let entries = provider.resources(from, to).await?;
    Ok(remove_nulls(entries))
}

fn remove_nulls(entries: Vec<Option<Value>>) -> Vec<Value> {
    let fetched = entries.len();
    let resources: Vec<Value> = entries
        .into_iter()
        .flatten()
        .filter(|v| !v.is_null())
        .collect();
    if resources.len() < fetched {
        tracing::debug!(
            stripped = fetched - resources.len(),
            "Removed null entries from result list"
        );
    }
    resources
}

fn validate_ids(resources: &[Value]) -> SearchResult<()> {
    for resource in resources {
        if resource_id(resource).is_none() && resource_type(resource) != Some(OPERATION_OUTCOME) {
            return Err(SearchError::DataIntegrity {
                resource_type: resource_type(resource).unwrap_or("unknown").to_string(),
                message: "every returned resource must carry an id".to_string(),
            });
        }
    }
    Ok(())
}

fn resource_type(resource: &Value) -> Option<&str> {
    resource.get("resourceType").and_then(Value::as_str)
}

fn resource_id(resource: &Value) -> Option<&str> {
    resource
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
}
