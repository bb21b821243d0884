//! Result paging.
//!
//! - [`provider`] - the [`MatchProvider`] and [`PagingCache`] seams plus
//!   in-memory implementations
//! - [`page`] - assembles one page under offset or cursor paging
//! - [`links`] - self/next/previous links for an assembled page
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_search::SearchConfig;
//! use helios_search::paging::{
//!     InMemoryPagingCache, ListMatchProvider, PagingCache, RequestContext,
//!     ResponseBundleBuilder, ResponseBundleRequest,
//! };
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let resources = (0..25)
//!     .map(|i| json!({"resourceType": "Patient", "id": format!("p{}", i)}))
//!     .collect();
//! let cache: Arc<dyn PagingCache> = Arc::new(InMemoryPagingCache::new(10, 100));
//! let builder = ResponseBundleBuilder::new(SearchConfig::default(), Some(cache));
//!
//! let request = ResponseBundleRequest::new(
//!     Arc::new(ListMatchProvider::new(resources)),
//!     RequestContext::new("http://example.com/fhir", "Patient"),
//!     "http://example.com/fhir/Patient",
//! );
//! let bundle = builder.build_response_bundle(&request).await.unwrap();
//! assert_eq!(bundle.entry.len(), 10);
//! assert_eq!(bundle.total, Some(25));
//! assert!(bundle.link_url("next").unwrap().contains("_getpagesoffset=10"));
//! # }
//! ```

pub mod links;
pub mod page;
pub mod provider;

pub use links::build_links;
pub use page::{ResponseBundleBuilder, ResponseBundleRequest};
pub use provider::{
    InMemoryPagingCache, ListMatchProvider, MatchProvider, PagingCache, RequestContext,
};
