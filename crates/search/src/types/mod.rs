//! Core types for search compilation and paging.
//!
//! - [`SearchParameter`], [`SearchQuery`] - the criteria coming in from the request layer
//! - [`RequestedPage`], [`PageDescriptor`] - the paging window asked for
//! - [`ResponsePage`], [`BundleLinks`], [`SearchBundle`] - what goes back out
//!
//! # Examples
//!
//! ## Building a Search Query
//!
//! ```
//! use helios_search::types::{SearchQuery, SearchParameter, SearchParamType};
//!
//! let query = SearchQuery::new("Observation")
//!     .with_parameter(
//!         SearchParameter::new("date", SearchParamType::Date).with_tokens(["ge2011-01-01"]),
//!     )
//!     .with_parameter(
//!         SearchParameter::new("value-quantity", SearchParamType::Quantity)
//!             .with_tokens(["ap5.4|http://unitsofmeasure.org|mg"]),
//!     )
//!     .with_count(20);
//!
//! assert_eq!(query.parameters.len(), 2);
//! ```

mod pagination;
mod search_params;

pub use pagination::{
    BundleEntry, BundleEntrySearch, BundleLink, BundleLinks, BundleType, PageDescriptor,
    PagingMode, RequestedPage, ResponsePage, SearchBundle, SearchEntryMode,
};

pub use search_params::{
    SearchModifier, SearchParamType, SearchParameter, SearchPrefix, SearchQuery, SearchValue,
};
