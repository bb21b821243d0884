//! Number parameter predicate handler.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{SearchError, SearchResult};
use crate::predicate::{ColumnRef, CompareOp, IndexColumn, JoinHandle, PredicateNode};
use crate::types::{SearchParamType, SearchPrefix, SearchValue};

/// Handles number parameter predicates.
pub struct NumberHandler;

impl NumberHandler {
    /// Builds the value predicate for a number parameter value.
    ///
    /// `eq`/`ne` compare exactly, `ap` matches the closed interval
    /// `[v - fuzz, v + fuzz]`. `sa`/`eb` are rejected.
    pub fn build_predicate(join: JoinHandle, value: &SearchValue) -> SearchResult<PredicateNode> {
        let number = Self::parse_number(&value.value)?;
        Self::compare(
            join.column(IndexColumn::ValueNumber),
            SearchParamType::Number,
            value,
            number,
        )
    }

    /// Parses a decimal search value.
    pub fn parse_number(raw: &str) -> SearchResult<Decimal> {
        let trimmed = raw.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| SearchError::InvalidNumber {
                value: raw.to_string(),
            })
    }

    /// Compares `column` with `number` according to the value's prefix.
    ///
    /// Shared by number and quantity predicates; `param_type` only feeds the
    /// error raised for unsupported prefixes.
    pub fn compare(
        column: ColumnRef,
        param_type: SearchParamType,
        value: &SearchValue,
        number: Decimal,
    ) -> SearchResult<PredicateNode> {
        let predicate = match value.prefix {
            SearchPrefix::Eq => PredicateNode::compare(column, CompareOp::Eq, number),
            SearchPrefix::Ne => PredicateNode::compare(column, CompareOp::Ne, number),
            SearchPrefix::Gt => PredicateNode::compare(column, CompareOp::Gt, number),
            SearchPrefix::Ge => PredicateNode::compare(column, CompareOp::Ge, number),
            SearchPrefix::Lt => PredicateNode::compare(column, CompareOp::Lt, number),
            SearchPrefix::Le => PredicateNode::compare(column, CompareOp::Le, number),
            SearchPrefix::Ap => {
                let fuzz = calculate_fuzz_amount(value.prefix, number);
                let out_of_range = || SearchError::InvalidNumber {
                    value: value.to_query_token(),
                };
                let low = number.checked_sub(fuzz).ok_or_else(out_of_range)?;
                let high = number.checked_add(fuzz).ok_or_else(out_of_range)?;
                tracing::trace!("Searching for {} <= val <= {}", low, high);
                PredicateNode::compare(column, CompareOp::Ge, low).and(PredicateNode::compare(
                    column,
                    CompareOp::Le,
                    high,
                ))
            }
            SearchPrefix::Sa | SearchPrefix::Eb => {
                return Err(SearchError::UnsupportedPrefix {
                    prefix: value.prefix,
                    param_type,
                    value: value.to_query_token(),
                });
            }
        };
        Ok(predicate)
    }
}

/// Tolerance applied around `value` for an approximate or implicit-precision match.
///
/// For `ap` this is 10% of the magnitude, never less than half a unit of the
/// value's last significant digit. For every other prefix it is half a unit of
/// the last significant digit (`100` -> `0.5`, `1.50` -> `0.005`).
pub fn calculate_fuzz_amount(prefix: SearchPrefix, value: Decimal) -> Decimal {
    let half_unit =
        Decimal::try_new(5, value.scale() + 1).unwrap_or_else(|_| Decimal::new(1, 28));
    match prefix {
        SearchPrefix::Ap => (value.abs() * Decimal::new(1, 1)).max(half_unit),
        _ => half_unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::PredicateValue;

    fn join() -> JoinHandle {
        JoinHandle::new(0)
    }

    #[test]
    fn test_eq_is_exact() {
        let pred = NumberHandler::build_predicate(join(), &SearchValue::eq("100")).unwrap();
        assert_eq!(pred.to_string(), "j0.value_number = 100");
    }

    #[test]
    fn test_ne_is_exact() {
        let pred =
            NumberHandler::build_predicate(join(), &SearchValue::new(SearchPrefix::Ne, "1.5"))
                .unwrap();
        assert_eq!(pred.to_string(), "j0.value_number <> 1.5");
    }

    #[test]
    fn test_ordering_prefixes() {
        for (prefix, op) in [
            (SearchPrefix::Gt, CompareOp::Gt),
            (SearchPrefix::Ge, CompareOp::Ge),
            (SearchPrefix::Lt, CompareOp::Lt),
            (SearchPrefix::Le, CompareOp::Le),
        ] {
            let pred =
                NumberHandler::build_predicate(join(), &SearchValue::new(prefix, "7")).unwrap();
            let cmp = pred.comparisons_on(IndexColumn::ValueNumber);
            assert_eq!(cmp, vec![(op, &PredicateValue::Decimal(Decimal::from(7)))]);
        }
    }

    #[test]
    fn test_ap_closed_interval() {
        let pred =
            NumberHandler::build_predicate(join(), &SearchValue::new(SearchPrefix::Ap, "100"))
                .unwrap();
        let cmp = pred.comparisons_on(IndexColumn::ValueNumber);
        assert_eq!(
            cmp,
            vec![
                (CompareOp::Ge, &PredicateValue::Decimal(Decimal::from(90))),
                (CompareOp::Le, &PredicateValue::Decimal(Decimal::from(110))),
            ]
        );
    }

    #[test]
    fn test_ap_at_decimal_limits() {
        for raw in [
            "79228162514264337593543950335",
            "-79228162514264337593543950335",
        ] {
            let err =
                NumberHandler::build_predicate(join(), &SearchValue::new(SearchPrefix::Ap, raw))
                    .unwrap_err();
            match err {
                SearchError::InvalidNumber { value } => assert_eq!(value, format!("ap{}", raw)),
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn test_sa_eb_rejected() {
        for prefix in [SearchPrefix::Sa, SearchPrefix::Eb] {
            let err = NumberHandler::build_predicate(join(), &SearchValue::new(prefix, "5"))
                .unwrap_err();
            assert!(err.is_invalid_request());
            let message = err.to_string();
            assert!(message.contains(prefix.as_str()), "{}", message);
            assert!(message.contains(&format!("{}5", prefix)), "{}", message);
        }
    }

    #[test]
    fn test_invalid_number() {
        let err = NumberHandler::build_predicate(join(), &SearchValue::eq("abc")).unwrap_err();
        assert!(matches!(err, SearchError::InvalidNumber { ref value } if value == "abc"));
        assert!(err.is_invalid_request());

        let err = NumberHandler::parse_number("1e999").unwrap_err();
        assert_eq!(err.to_string(), "invalid numeric value: 1e999");
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(
            NumberHandler::parse_number("1e2").unwrap(),
            Decimal::from(100)
        );
    }

    #[test]
    fn test_fuzz_amount() {
        assert_eq!(
            calculate_fuzz_amount(SearchPrefix::Eq, Decimal::from(100)),
            Decimal::new(5, 1)
        );
        assert_eq!(
            calculate_fuzz_amount(SearchPrefix::Eq, Decimal::new(150, 2)),
            Decimal::new(5, 3)
        );
        assert_eq!(
            calculate_fuzz_amount(SearchPrefix::Ap, Decimal::from(-200)),
            Decimal::from(20)
        );
        // 10% of 1 is below half a unit of 1
        assert_eq!(
            calculate_fuzz_amount(SearchPrefix::Ap, Decimal::from(1)),
            Decimal::new(5, 1)
        );
    }
}
