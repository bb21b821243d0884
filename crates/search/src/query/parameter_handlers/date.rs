//! Date parameter predicate handler.
//!
//! Index rows store each indexed date as a half-open range `[low, high)` at the
//! precision it was recorded with. Search values are expanded to a
//! [`DateRange`] and compared against those rows:
//!
//! | Prefix | Matches rows where |
//! |--------|--------------------|
//! | `eq` | the row lies within the value's window |
//! | `ne` | the row lies entirely outside the window |
//! | `gt`, `ge` | the row extends past the lower bound |
//! | `lt`, `le` | the row starts before the upper bound |
//! | `sa` | the row starts at or after the end of the window |
//! | `eb` | the row ends at or before the start of the window |
//! | `ap` | the row overlaps the window widened by one unit each side |

use crate::error::SearchResult;
use crate::predicate::{CompareOp, IndexColumn, JoinHandle, PredicateNode};
use crate::query::date_range::{DateRange, DateToken};
use crate::types::{SearchPrefix, SearchValue};

/// Handles date parameter predicates.
pub struct DateHandler;

impl DateHandler {
    /// Builds the value predicate for a date parameter value.
    pub fn build_predicate(join: JoinHandle, value: &SearchValue) -> SearchResult<PredicateNode> {
        let low = join.column(IndexColumn::ValueLow);
        let high = join.column(IndexColumn::ValueHigh);
        let range = DateRange::from_values(std::slice::from_ref(value))?;

        let predicate = match value.prefix {
            SearchPrefix::Eq => PredicateNode::all(
                range
                    .lower
                    .map(|lower| PredicateNode::compare(low, CompareOp::Ge, lower))
                    .into_iter()
                    .chain(
                        range
                            .upper
                            .map(|upper| PredicateNode::compare(high, CompareOp::Le, upper)),
                    ),
            ),
            SearchPrefix::Ne => {
                let mut outside = Vec::new();
                if let Some(lower) = range.lower {
                    outside.push(PredicateNode::compare(high, CompareOp::Le, lower));
                }
                if let Some(upper) = range.upper {
                    outside.push(PredicateNode::compare(low, CompareOp::Ge, upper));
                }
                PredicateNode::any(outside)
            }
            SearchPrefix::Gt | SearchPrefix::Ge => match range.lower {
                Some(lower) => PredicateNode::compare(high, CompareOp::Gt, lower),
                None => PredicateNode::all(Vec::new()),
            },
            SearchPrefix::Lt | SearchPrefix::Le => match range.upper {
                Some(upper) => PredicateNode::compare(low, CompareOp::Lt, upper),
                None => PredicateNode::all(Vec::new()),
            },
            SearchPrefix::Sa => match range.lower {
                Some(end) => PredicateNode::compare(low, CompareOp::Ge, end),
                None => PredicateNode::all(Vec::new()),
            },
            SearchPrefix::Eb => match range.upper {
                Some(start) => PredicateNode::compare(high, CompareOp::Le, start),
                None => PredicateNode::all(Vec::new()),
            },
            SearchPrefix::Ap => {
                let token = DateToken::parse(&value.value)?;
                let widened_start = token.shifted(-1)?;
                let widened_end = token.shifted(2)?;
                PredicateNode::compare(low, CompareOp::Lt, widened_end).and(
                    PredicateNode::compare(high, CompareOp::Gt, widened_start),
                )
            }
        };
        Ok(predicate)
    }
}
