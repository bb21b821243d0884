//! Reference parameter predicate handler.

use url::Url;

use crate::error::{SearchError, SearchResult};
use crate::predicate::{IndexColumn, JoinHandle, PredicateNode};
use crate::types::{SearchModifier, SearchValue};

/// Handles reference parameter predicates.
pub struct ReferenceHandler;

impl ReferenceHandler {
    /// Builds the value predicate for a reference parameter value.
    ///
    /// Reference values can be:
    /// - `id` - local reference (just the id)
    /// - `Type/id` - relative reference (a trailing `/_history/n` is ignored)
    /// - `url` - absolute URL reference
    ///
    /// A `:Type` modifier restricts the target type and must agree with a
    /// type given in the value.
    pub fn build_predicate(
        join: JoinHandle,
        value: &SearchValue,
        modifier: Option<&SearchModifier>,
    ) -> SearchResult<PredicateNode> {
        let raw = value.value.trim();

        if Url::parse(raw).is_ok() {
            return Ok(PredicateNode::eq(
                join.column(IndexColumn::TargetResourceUrl),
                raw,
            ));
        }

        let type_modifier = match modifier {
            Some(SearchModifier::Type(t)) => Some(t.as_str()),
            _ => None,
        };

        let (target_type, target_id) = Self::split_relative(raw);
        let target_type = match (target_type, type_modifier) {
            (Some(given), Some(required)) if given != required => {
                return Err(SearchError::invalid(format!(
                    "reference '{}' does not match required target type {}",
                    raw, required
                )));
            }
            (Some(given), _) => Some(given),
            (None, required) => required,
        };

        if target_id.is_empty() {
            return Err(SearchError::invalid(format!(
                "reference '{}' has no resource id",
                raw
            )));
        }

        let id = PredicateNode::eq(join.column(IndexColumn::TargetResourceId), target_id);
        Ok(match target_type {
            Some(t) => PredicateNode::eq(join.column(IndexColumn::TargetResourceType), t).and(id),
            None => id,
        })
    }

    fn split_relative(raw: &str) -> (Option<&str>, &str) {
        let raw = match raw.find("/_history/") {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        match raw.rsplit_once('/') {
            Some((resource_type, id)) if !resource_type.is_empty() => {
                // Only the last path segment pair matters
                let resource_type = resource_type.rsplit('/').next().unwrap_or(resource_type);
                (Some(resource_type), id)
            }
            _ => (None, raw),
        }
    }
}
