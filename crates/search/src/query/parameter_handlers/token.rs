//! Token parameter predicate handler.

use crate::predicate::{IndexColumn, JoinHandle, PredicateNode};
use crate::types::{SearchModifier, SearchValue};

/// Handles token parameter predicates.
pub struct TokenHandler;

impl TokenHandler {
    /// Builds the value predicate for a token parameter value.
    ///
    /// Token values can be:
    /// - `code` - matches any system
    /// - `system|code` - matches specific system and code
    /// - `|code` - matches code with no system
    /// - `system|` - matches any code in system
    ///
    /// `:not` negates the value predicate only; the identity predicate the
    /// caller adds still selects the parameter's rows.
    pub fn build_predicate(
        join: JoinHandle,
        value: &SearchValue,
        modifier: Option<&SearchModifier>,
    ) -> PredicateNode {
        let predicate = Self::build_match(join, &value.value);
        if matches!(modifier, Some(SearchModifier::Not)) {
            predicate.negate()
        } else {
            predicate
        }
    }

    fn build_match(join: JoinHandle, token: &str) -> PredicateNode {
        let system_col = join.column(IndexColumn::TokenSystem);
        let code_col = join.column(IndexColumn::TokenValue);

        match token.split_once('|') {
            Some(("", code)) => PredicateNode::is_null(system_col)
                .and(PredicateNode::eq(code_col, code)),
            Some((system, "")) => PredicateNode::eq(system_col, system),
            Some((system, code)) => {
                PredicateNode::eq(system_col, system).and(PredicateNode::eq(code_col, code))
            }
            None => PredicateNode::eq(code_col, token),
        }
    }
}
