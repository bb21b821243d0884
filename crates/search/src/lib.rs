//! Helios FHIR Server Search Core
//!
//! This crate translates FHIR search criteria into storage-neutral predicate
//! trees and assembles paged result bundles from whatever the storage engine
//! returns.
//!
//! # Features
//!
//! - **Predicate Compilation**: Date, number, quantity, string, token, uri,
//!   reference and coordinate parameters with prefixes and modifiers
//! - **Join Sharing**: Every criterion on the same parameter reads one index join
//! - **Partitioning**: Partition-aware identity hashes and predicates
//! - **Paging**: Offset and cursor paging with self/next/previous links
//!
//! # Architecture
//!
//! - [`types`] - Search parameters, values and paging types
//! - [`predicate`] - The predicate tree and index join arena
//! - [`partition`] - Request partitions and identity hashes
//! - [`query`] - Compiles a [`SearchQuery`] into a [`CompiledQuery`]
//! - [`paging`] - Turns a [`MatchProvider`] into pages and bundles
//! - [`config`] - Runtime settings
//! - [`error`] - Error types for all operations
//!
//! # Search
//!
//! ```
//! use helios_search::{SearchBuilder, SearchConfig};
//! use helios_search::partition::RequestPartition;
//! use helios_search::types::{SearchModifier, SearchParamType, SearchParameter, SearchQuery};
//!
//! let query = SearchQuery::new("Patient")
//!     .with_partition(RequestPartition::with_id(1))
//!     .with_parameter(
//!         SearchParameter::new("name", SearchParamType::String)
//!             .with_modifier(SearchModifier::Contains)
//!             .with_tokens(["smi"]),
//!     )
//!     .with_parameter(
//!         SearchParameter::new("birthdate", SearchParamType::Date).with_tokens(["ge1970"]),
//!     );
//!
//! let compiled = SearchBuilder::new(SearchConfig::default()).compile(&query).unwrap();
//! assert_eq!(compiled.joins.len(), 2);
//! assert!(compiled.predicate.to_string().contains("j0.partition_id = 1"));
//! ```
//!
//! # Paging
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_search::SearchConfig;
//! use helios_search::paging::{
//!     ListMatchProvider, RequestContext, ResponseBundleBuilder, ResponseBundleRequest,
//! };
//! use helios_search::types::{PagingMode, RequestedPage};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let resources = (0..25)
//!     .map(|i| json!({"resourceType": "Patient", "id": format!("p{}", i)}))
//!     .collect();
//! let builder = ResponseBundleBuilder::new(SearchConfig::default(), None);
//! let request = ResponseBundleRequest::new(
//!     Arc::new(ListMatchProvider::new(resources)),
//!     RequestContext::new("http://example.com/fhir", "Patient"),
//!     "http://example.com/fhir/Patient?_offset=20&_count=10",
//! )
//! .with_requested_page(RequestedPage::offset(20, 10));
//!
//! let page = builder.build_response_page(&request).await.unwrap();
//! assert_eq!(page.mode, PagingMode::Offset);
//! assert_eq!(page.len(), 5);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod paging;
pub mod partition;
pub mod predicate;
pub mod query;
pub mod types;

// Re-export commonly used types at crate root
pub use config::SearchConfig;
pub use error::{SearchError, SearchResult};
pub use types::{SearchParameter, SearchQuery};

pub use paging::{MatchProvider, PagingCache, ResponseBundleBuilder, ResponseBundleRequest};
pub use predicate::PredicateNode;
pub use query::{CompiledQuery, SearchBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
