//! Parameter-specific predicate handlers.
//!
//! Each handler knows how to build the value predicate for its parameter type.
//! [`build_value_predicate`] dispatches over the closed set of types.

mod coords;
mod date;
mod number;
mod quantity;
mod reference;
mod string;
mod token;
mod uri;

pub use coords::CoordsHandler;
pub use date::DateHandler;
pub use number::{NumberHandler, calculate_fuzz_amount};
pub use quantity::QuantityHandler;
pub use reference::ReferenceHandler;
pub use string::{StringHandler, left_and_right_match, left_match, normalize};
pub use token::TokenHandler;
pub use uri::UriHandler;

use crate::error::SearchResult;
use crate::predicate::{JoinHandle, PredicateNode};
use crate::types::{SearchModifier, SearchParamType, SearchValue};

/// Builds the value predicate for one search value of the given type.
pub fn build_value_predicate(
    param_type: SearchParamType,
    join: JoinHandle,
    value: &SearchValue,
    modifier: Option<&SearchModifier>,
) -> SearchResult<PredicateNode> {
    match param_type {
        SearchParamType::Date => DateHandler::build_predicate(join, value),
        SearchParamType::Number => NumberHandler::build_predicate(join, value),
        SearchParamType::Quantity => QuantityHandler::build_predicate(join, value),
        SearchParamType::Reference => ReferenceHandler::build_predicate(join, value, modifier),
        SearchParamType::String => Ok(StringHandler::build_predicate(join, value, modifier)),
        SearchParamType::Uri => Ok(UriHandler::build_predicate(join, value)),
        SearchParamType::Token => Ok(TokenHandler::build_predicate(join, value, modifier)),
        SearchParamType::Coords => CoordsHandler::build_predicate(join, value),
    }
}
