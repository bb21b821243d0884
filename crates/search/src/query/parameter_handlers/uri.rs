//! URI parameter predicate handler.

use crate::predicate::{IndexColumn, JoinHandle, PredicateNode};
use crate::types::SearchValue;

/// Handles URI parameter predicates.
pub struct UriHandler;

impl UriHandler {
    /// Builds the value predicate for a URI parameter value.
    ///
    /// URIs match exactly.
    pub fn build_predicate(join: JoinHandle, value: &SearchValue) -> PredicateNode {
        PredicateNode::eq(join.column(IndexColumn::Uri), value.value.as_str())
    }
}
