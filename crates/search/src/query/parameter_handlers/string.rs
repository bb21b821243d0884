//! String parameter predicate handler.

use crate::predicate::{CompareOp, IndexColumn, JoinHandle, PredicateNode};
use crate::types::{SearchModifier, SearchValue};

/// Handles string parameter predicates.
pub struct StringHandler;

impl StringHandler {
    /// Builds the value predicate for a string parameter value.
    ///
    /// Default behavior is a case-insensitive prefix match on the normalized
    /// column. `:exact` compares the raw value, `:contains` matches anywhere.
    pub fn build_predicate(
        join: JoinHandle,
        value: &SearchValue,
        modifier: Option<&SearchModifier>,
    ) -> PredicateNode {
        match modifier {
            Some(SearchModifier::Exact) => {
                PredicateNode::eq(join.column(IndexColumn::ValueExact), value.value.as_str())
            }
            Some(SearchModifier::Contains) => PredicateNode::compare(
                join.column(IndexColumn::ValueNormalized),
                CompareOp::Like,
                left_and_right_match(&normalize(&value.value)),
            ),
            _ => PredicateNode::compare(
                join.column(IndexColumn::ValueNormalized),
                CompareOp::Like,
                left_match(&normalize(&value.value)),
            ),
        }
    }
}

/// Folds a string the way the normalized index column is stored.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn escape_like(value: &str) -> String {
    value.replace('%', "[%]")
}

/// `value%`, with literal `%` escaped.
pub fn left_match(value: &str) -> String {
    format!("{}%", escape_like(value))
}

/// `%value%`, with literal `%` escaped.
pub fn left_and_right_match(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_default() {
        let pred =
            StringHandler::build_predicate(JoinHandle::new(0), &SearchValue::eq("Smith"), None);
        assert_eq!(pred.to_string(), "j0.value_normalized LIKE 'smith%'");
    }

    #[test]
    fn test_string_exact() {
        let pred = StringHandler::build_predicate(
            JoinHandle::new(0),
            &SearchValue::eq("Smith"),
            Some(&SearchModifier::Exact),
        );
        assert_eq!(pred.to_string(), "j0.value_exact = 'Smith'");
    }

    #[test]
    fn test_string_contains() {
        let pred = StringHandler::build_predicate(
            JoinHandle::new(0),
            &SearchValue::eq("mit"),
            Some(&SearchModifier::Contains),
        );
        assert_eq!(pred.to_string(), "j0.value_normalized LIKE '%mit%'");
    }

    #[test]
    fn test_like_escaping() {
        assert_eq!(left_match("50%"), "50[%]%");
        assert_eq!(left_and_right_match("a%b"), "%a[%]b%");
        assert_eq!(left_and_right_match("x"), "%x%");
    }
}
