//! Tests for prefixed date ranges.
//!
//! This module checks the half-open ranges produced for prefixed date pairs
//! at each precision, and the date predicates built from them.

use chrono::{DateTime, TimeZone, Utc};

use helios_search::query::{DatePrecision, DateRange};
use helios_search::types::{SearchParamType, SearchParameter, SearchQuery};
use helios_search::{SearchBuilder, SearchConfig};

fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

fn assert_range(tokens: &[&str], lower: DateTime<Utc>, upper: DateTime<Utc>) {
    let range = DateRange::parse(tokens).unwrap();
    assert_eq!(range.lower, Some(lower), "lower bound of {:?}", tokens);
    assert_eq!(range.upper, Some(upper), "upper bound of {:?}", tokens);
    assert!(lower <= upper);
}

// ============================================================================
// Literal Ranges
// ============================================================================

#[test]
fn test_year_ge_lt() {
    assert_range(&[">=2011", "<2012"], utc(2011, 1, 1, 0), utc(2012, 1, 1, 0));

    let range = DateRange::parse(&[">=2011", "<2012"]).unwrap();
    assert_eq!(
        range.upper_bound_as_instant().unwrap().to_rfc3339(),
        "2011-12-31T23:59:59.999+00:00"
    );
}

#[test]
fn test_year_gt_le() {
    assert_range(&[">2011", "<=2013"], utc(2012, 1, 1, 0), utc(2014, 1, 1, 0));
}

#[test]
fn test_month_ge_lt() {
    assert_range(&[">=2011-01", "<2011-02"], utc(2011, 1, 1, 0), utc(2011, 2, 1, 0));
}

#[test]
fn test_day_gt_le() {
    assert_range(
        &[">2011-01-01", "<=2011-01-02"],
        utc(2011, 1, 2, 0),
        utc(2011, 1, 3, 0),
    );
}

#[test]
fn test_second_ge_lt() {
    assert_range(
        &[">=2011-01-01T00:00:00", "<2011-01-01T02:00:00"],
        utc(2011, 1, 1, 0),
        utc(2011, 1, 1, 2),
    );
}

#[test]
fn test_two_letter_prefixes_match_symbols() {
    let symbolic = DateRange::parse(&[">=2011", "<2012"]).unwrap();
    let lettered = DateRange::parse(&["ge2011", "lt2012"]).unwrap();
    assert_eq!(symbolic.lower, lettered.lower);
    assert_eq!(symbolic.upper, lettered.upper);
}

#[test]
fn test_pair_precision_is_finest() {
    let range = DateRange::parse(&["ge2011", "lt2011-06-15"]).unwrap();
    assert_eq!(range.precision, DatePrecision::Day);
}

#[test]
fn test_open_ended_range() {
    let range = DateRange::parse(&["ge2011-03"]).unwrap();
    assert_eq!(range.lower, Some(utc(2011, 3, 1, 0)));
    assert!(range.upper.is_none());
    assert!(range.upper_bound_as_instant().is_none());
    assert!(!range.is_unbounded());
}

#[test]
fn test_malformed_pair_rejected() {
    assert!(DateRange::parse(&["ge2011", "ge2012"]).is_err());
    assert!(DateRange::parse(&["ge2013", "lt2012"]).is_err());
    assert!(DateRange::parse(&["eq2011", "lt2012"]).is_err());
    assert!(DateRange::parse(&["ge2011-13"]).is_err());
    assert!(DateRange::parse(&[]).is_err());
}

// ============================================================================
// Date Predicates
// ============================================================================

#[test]
fn test_date_criteria_share_one_join() {
    let query = SearchQuery::new("Observation")
        .with_parameter(SearchParameter::new("date", SearchParamType::Date).with_tokens(["ge2011"]))
        .with_parameter(SearchParameter::new("date", SearchParamType::Date).with_tokens(["lt2012"]));
    let compiled = SearchBuilder::new(SearchConfig::default())
        .compile(&query)
        .unwrap();

    assert_eq!(compiled.joins.len(), 1);
    let rendered = compiled.predicate.to_string();
    assert!(rendered.contains("j0.value_high > '2011-01-01T00:00:00.000Z'"));
    assert!(rendered.contains("j0.value_low < '2012-01-01T00:00:00.000Z'"));
}

#[test]
fn test_date_sa_on_number_rejected() {
    let query = SearchQuery::new("Observation").with_parameter(
        SearchParameter::new("value", SearchParamType::Number).with_tokens(["sa5"]),
    );
    let err = SearchBuilder::default().compile(&query).unwrap_err();
    assert!(err.is_invalid_request());
}
