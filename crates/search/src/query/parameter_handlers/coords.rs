//! Coordinates parameter predicate handler.

use rust_decimal::Decimal;

use crate::error::{SearchError, SearchResult};
use crate::predicate::{IndexColumn, JoinHandle, PredicateNode};
use crate::types::SearchValue;

use super::NumberHandler;

/// Handles `lat|long` coordinate predicates.
pub struct CoordsHandler;

impl CoordsHandler {
    /// Builds the value predicate for a coordinate value.
    ///
    /// Both components must be decimal degrees within range; the match is exact.
    pub fn build_predicate(join: JoinHandle, value: &SearchValue) -> SearchResult<PredicateNode> {
        let (lat, long) = value.value.split_once('|').ok_or_else(|| {
            SearchError::invalid(format!(
                "coordinates must be 'latitude|longitude': {}",
                value.value
            ))
        })?;
        let lat = NumberHandler::parse_number(lat)?;
        let long = NumberHandler::parse_number(long)?;

        if lat.abs() > Decimal::from(90) || long.abs() > Decimal::from(180) {
            return Err(SearchError::invalid(format!(
                "coordinates out of range: {}",
                value.value
            )));
        }

        Ok(PredicateNode::eq(join.column(IndexColumn::Latitude), lat)
            .and(PredicateNode::eq(join.column(IndexColumn::Longitude), long)))
    }
}
