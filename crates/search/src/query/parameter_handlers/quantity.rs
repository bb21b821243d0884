//! Quantity parameter predicate handler.

use crate::error::SearchResult;
use crate::predicate::{IndexColumn, JoinHandle, PredicateNode};
use crate::types::{SearchParamType, SearchValue};

use super::NumberHandler;

/// Handles quantity parameter predicates.
pub struct QuantityHandler;

impl QuantityHandler {
    /// Builds the value predicate for a quantity parameter value.
    ///
    /// Quantity format: `[prefix]number[|system|code]`
    /// - `5.4` - value only
    /// - `5.4||mg` - value with code, any system
    /// - `5.4|http://unitsofmeasure.org|mg` - value with system and code
    ///
    /// The numeric part follows [`NumberHandler`] semantics, including the
    /// rejection of `sa`/`eb`.
    pub fn build_predicate(join: JoinHandle, value: &SearchValue) -> SearchResult<PredicateNode> {
        let (number, system, code) = Self::parse_quantity(&value.value);
        let number = NumberHandler::parse_number(number)?;

        let mut parts = vec![NumberHandler::compare(
            join.column(IndexColumn::ValueNumber),
            SearchParamType::Quantity,
            value,
            number,
        )?];
        if let Some(system) = system {
            parts.push(PredicateNode::eq(join.column(IndexColumn::System), system));
        }
        if let Some(code) = code {
            parts.push(PredicateNode::eq(join.column(IndexColumn::Units), code));
        }
        Ok(PredicateNode::all(parts))
    }

    /// Splits a quantity into number, system and code. Empty parts are `None`.
    fn parse_quantity(value: &str) -> (&str, Option<&str>, Option<&str>) {
        let mut parts = value.splitn(3, '|');
        let number = parts.next().unwrap_or_default();
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.filter(|s| !s.is_empty())
        }
        let system = non_empty(parts.next());
        let code = non_empty(parts.next());
        (number, system, code)
    }
}
