//! Search criteria compilation.
//!
//! - [`date_range`] - prefixed date tokens to half-open ranges
//! - [`parameter_handlers`] - per-type value predicates
//! - [`identity`] - identity, partition and `:missing` predicates
//! - [`builder`] - assembles everything into a [`CompiledQuery`]
//!
//! # Examples
//!
//! ```
//! use helios_search::SearchConfig;
//! use helios_search::query::SearchBuilder;
//! use helios_search::types::{SearchParamType, SearchParameter, SearchQuery};
//!
//! let builder = SearchBuilder::new(SearchConfig::default());
//! let query = SearchQuery::new("Observation")
//!     .with_parameter(SearchParameter::new("date", SearchParamType::Date).with_tokens(["ge2011"]))
//!     .with_parameter(SearchParameter::new("date", SearchParamType::Date).with_tokens(["lt2012"]));
//!
//! let compiled = builder.compile(&query).unwrap();
//! // Both criteria read the same join
//! assert_eq!(compiled.joins.len(), 1);
//! assert!(compiled.has_index_joins);
//! ```

pub mod builder;
pub mod date_range;
pub mod identity;
pub mod parameter_handlers;

pub use builder::{CompiledQuery, SearchBuilder};
pub use date_range::{DatePrecision, DateRange, DateToken};
pub use identity::IdentityPredicateBuilder;
pub use parameter_handlers::calculate_fuzz_amount;
