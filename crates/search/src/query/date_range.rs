//! Parsing of prefixed date/time tokens into half-open ranges.
//!
//! A token such as `ge2011-01` is read at the precision of its most specific
//! component. The *base instant* is the earliest instant at that precision, and
//! "one unit" is one calendar step of that precision (month lengths and leap
//! years included).
//!
//! | Prefix | Bound set |
//! |--------|-----------|
//! | `ge` | lower = base |
//! | `gt`, `sa` | lower = base + 1 unit |
//! | `lt`, `eb` | upper = base |
//! | `le` | upper = base + 1 unit |
//! | `eq` (single token) | [base, base + 1 unit) |

use std::fmt;
use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};
use crate::types::{SearchPrefix, SearchValue};

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:T(\d{2})(?::(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?(Z|[+-]\d{2}:\d{2})?)?)?)?$",
    )
    .expect("date token pattern is a valid regex")
});

/// The granularity of a partial date/time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    /// Year only (e.g., "2024")
    Year,
    /// Year and month (e.g., "2024-01")
    Month,
    /// Full date (e.g., "2024-01-15")
    Day,
    /// Date and time to hours (e.g., "2024-01-15T10")
    Hour,
    /// Date and time to minutes (e.g., "2024-01-15T10:30")
    Minute,
    /// Date and time to seconds (e.g., "2024-01-15T10:30:00")
    Second,
    /// Full precision with milliseconds
    Millisecond,
}

impl DatePrecision {
    /// Moves `instant` by `units` steps of this precision.
    ///
    /// Year and month steps use calendar arithmetic. Returns `None` when the
    /// result is out of range.
    pub fn add_units(&self, instant: DateTime<Utc>, units: i32) -> Option<DateTime<Utc>> {
        let months = |n: u32| {
            if units >= 0 {
                instant.checked_add_months(Months::new(n))
            } else {
                instant.checked_sub_months(Months::new(n))
            }
        };
        let steps = units.unsigned_abs();
        match self {
            DatePrecision::Year => months(steps.checked_mul(12)?),
            DatePrecision::Month => months(steps),
            DatePrecision::Day => instant.checked_add_signed(Duration::days(i64::from(units))),
            DatePrecision::Hour => instant.checked_add_signed(Duration::hours(i64::from(units))),
            DatePrecision::Minute => {
                instant.checked_add_signed(Duration::minutes(i64::from(units)))
            }
            DatePrecision::Second => {
                instant.checked_add_signed(Duration::seconds(i64::from(units)))
            }
            DatePrecision::Millisecond => {
                instant.checked_add_signed(Duration::milliseconds(i64::from(units)))
            }
        }
    }
}

impl fmt::Display for DatePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatePrecision::Year => write!(f, "year"),
            DatePrecision::Month => write!(f, "month"),
            DatePrecision::Day => write!(f, "day"),
            DatePrecision::Hour => write!(f, "hour"),
            DatePrecision::Minute => write!(f, "minute"),
            DatePrecision::Second => write!(f, "second"),
            DatePrecision::Millisecond => write!(f, "millisecond"),
        }
    }
}

/// A partial date/time read at its own precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateToken {
    /// The earliest instant at the token's precision.
    pub base: DateTime<Utc>,
    /// The token's precision.
    pub precision: DatePrecision,
}

impl DateToken {
    /// Parses a date/time string without prefix.
    pub fn parse(value: &str) -> SearchResult<Self> {
        let invalid = |message: &str| SearchError::InvalidDate {
            value: value.to_string(),
            message: message.to_string(),
        };

        let caps = DATE_TOKEN
            .captures(value.trim())
            .ok_or_else(|| invalid("expected yyyy[-mm[-dd[Thh[:mm[:ss[.fff]]][zone]]]]"))?;

        let number = |idx: usize, default: u32| -> u32 {
            caps.get(idx)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(default)
        };

        let year: i32 = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| invalid("missing year"))?;

        let precision = if caps.get(7).is_some() {
            DatePrecision::Millisecond
        } else if caps.get(6).is_some() {
            DatePrecision::Second
        } else if caps.get(5).is_some() {
            DatePrecision::Minute
        } else if caps.get(4).is_some() {
            DatePrecision::Hour
        } else if caps.get(3).is_some() {
            DatePrecision::Day
        } else if caps.get(2).is_some() {
            DatePrecision::Month
        } else {
            DatePrecision::Year
        };

        let millis = caps
            .get(7)
            .map(|m| {
                let digits: String = m.as_str().chars().chain("000".chars()).take(3).collect();
                digits.parse::<u32>().unwrap_or(0)
            })
            .unwrap_or(0);

        let date = NaiveDate::from_ymd_opt(year, number(2, 1), number(3, 1))
            .ok_or_else(|| invalid("no such calendar date"))?;
        let time = NaiveTime::from_hms_milli_opt(number(4, 0), number(5, 0), number(6, 0), millis)
            .ok_or_else(|| invalid("no such time of day"))?;
        let local = NaiveDateTime::new(date, time);

        let base = match caps.get(8).map(|m| m.as_str()) {
            None | Some("Z") => Utc.from_utc_datetime(&local),
            Some(zone) => {
                let offset = parse_offset(zone).ok_or_else(|| invalid("invalid zone offset"))?;
                offset
                    .from_local_datetime(&local)
                    .single()
                    .ok_or_else(|| invalid("ambiguous local time"))?
                    .with_timezone(&Utc)
            }
        };

        Ok(Self { base, precision })
    }

    /// Returns the instant one precision unit after the base.
    pub fn end(&self) -> SearchResult<DateTime<Utc>> {
        self.shifted(1)
    }

    /// Returns the base moved by `units` precision units.
    pub fn shifted(&self, units: i32) -> SearchResult<DateTime<Utc>> {
        self.precision
            .add_units(self.base, units)
            .ok_or_else(|| SearchError::InvalidDate {
                value: self.base.to_rfc3339(),
                message: format!("cannot move by {} {}(s)", units, self.precision),
            })
    }
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let sign = match zone.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = zone.get(1..3)?.parse().ok()?;
    let minutes: i32 = zone.get(4..6)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// A half-open range `[lower, upper)` built from one or two prefixed tokens.
///
/// An absent bound is unbounded on that side.
///
/// # Examples
///
/// ```
/// use helios_search::query::DateRange;
///
/// let range = DateRange::parse(&[">=2011", "<2012"]).unwrap();
/// assert_eq!(
///     range.lower_bound_as_instant().unwrap().to_rfc3339(),
///     "2011-01-01T00:00:00+00:00"
/// );
/// assert_eq!(
///     range.upper_bound_as_instant().unwrap().to_rfc3339(),
///     "2011-12-31T23:59:59.999+00:00"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub lower: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub upper: Option<DateTime<Utc>>,
    /// Precision of the most specific token.
    pub precision: DatePrecision,
    /// The prefixes the bounds came from, in token order.
    pub source_prefixes: Vec<SearchPrefix>,
}

impl DateRange {
    /// Parses raw query tokens (prefix included) into a range.
    pub fn parse(tokens: &[&str]) -> SearchResult<Self> {
        let values: Vec<SearchValue> = tokens.iter().map(|t| SearchValue::parse(t)).collect();
        Self::from_values(&values)
    }

    /// Builds a range from one or two prefixed values.
    ///
    /// A single value may carry any prefix. A pair must be one lower-bounding
    /// and one upper-bounding prefix.
    pub fn from_values(values: &[SearchValue]) -> SearchResult<Self> {
        match values {
            [single] => Self::from_single(single),
            [first, second] => Self::from_pair(first, second),
            _ => Err(SearchError::invalid(format!(
                "a date range takes one or two values, got {}",
                values.len()
            ))),
        }
    }

    fn from_single(value: &SearchValue) -> SearchResult<Self> {
        let token = DateToken::parse(&value.value)?;
        let mut range = Self {
            lower: None,
            upper: None,
            precision: token.precision,
            source_prefixes: vec![value.prefix],
        };
        match value.prefix {
            SearchPrefix::Eq | SearchPrefix::Ne | SearchPrefix::Ap => {
                range.lower = Some(token.base);
                range.upper = Some(token.end()?);
            }
            _ => range.apply_bound(value.prefix, &token, &value.value)?,
        }
        Ok(range)
    }

    fn from_pair(first: &SearchValue, second: &SearchValue) -> SearchResult<Self> {
        let a = DateToken::parse(&first.value)?;
        let b = DateToken::parse(&second.value)?;
        let mut range = Self {
            lower: None,
            upper: None,
            precision: a.precision.max(b.precision),
            source_prefixes: vec![first.prefix, second.prefix],
        };
        range.apply_bound(first.prefix, &a, &first.value)?;
        range.apply_bound(second.prefix, &b, &second.value)?;

        if let (Some(lower), Some(upper)) = (range.lower, range.upper) {
            if lower > upper {
                return Err(SearchError::invalid(format!(
                    "lower bound {} is after upper bound {}",
                    first.to_query_token(),
                    second.to_query_token()
                )));
            }
        }
        Ok(range)
    }

    fn apply_bound(
        &mut self,
        prefix: SearchPrefix,
        token: &DateToken,
        raw: &str,
    ) -> SearchResult<()> {
        let (slot, instant) = match prefix {
            SearchPrefix::Ge => (&mut self.lower, token.base),
            SearchPrefix::Gt | SearchPrefix::Sa => (&mut self.lower, token.end()?),
            SearchPrefix::Lt | SearchPrefix::Eb => (&mut self.upper, token.base),
            SearchPrefix::Le => (&mut self.upper, token.end()?),
            SearchPrefix::Eq | SearchPrefix::Ne | SearchPrefix::Ap => {
                return Err(SearchError::invalid(format!(
                    "prefix '{}' cannot bound a date range: {}",
                    prefix, raw
                )));
            }
        };
        if slot.is_some() {
            let side = if prefix.is_lower_bound() { "lower" } else { "upper" };
            return Err(SearchError::invalid(format!(
                "date range has two {} bounds: {}{}",
                side, prefix, raw
            )));
        }
        *slot = Some(instant);
        Ok(())
    }

    /// The first instant in range.
    pub fn lower_bound_as_instant(&self) -> Option<DateTime<Utc>> {
        self.lower
    }

    /// The last instant in range under an inclusive reading (upper - 1ms).
    pub fn upper_bound_as_instant(&self) -> Option<DateTime<Utc>> {
        self.upper
            .and_then(|u| u.checked_sub_signed(Duration::milliseconds(1)))
    }

    /// Returns true if the range is bounded on neither side.
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_precision_inference() {
        let cases = [
            ("2011", DatePrecision::Year),
            ("2011-02", DatePrecision::Month),
            ("2011-02-03", DatePrecision::Day),
            ("2011-02-03T10", DatePrecision::Hour),
            ("2011-02-03T10:30", DatePrecision::Minute),
            ("2011-02-03T10:30:15", DatePrecision::Second),
            ("2011-02-03T10:30:15.5", DatePrecision::Millisecond),
        ];
        for (token, expected) in cases {
            assert_eq!(DateToken::parse(token).unwrap().precision, expected, "{}", token);
        }
    }

    #[test]
    fn test_calendar_rollover() {
        let feb = DateToken::parse("2012-02").unwrap();
        assert_eq!(feb.end().unwrap(), utc("2012-03-01T00:00:00Z"));

        let leap_day = DateToken::parse("2012-02-29").unwrap();
        assert_eq!(leap_day.end().unwrap(), utc("2012-03-01T00:00:00Z"));

        let december = DateToken::parse("2011-12").unwrap();
        assert_eq!(december.end().unwrap(), utc("2012-01-01T00:00:00Z"));
    }

    #[test]
    fn test_timezone_normalized_to_utc() {
        let token = DateToken::parse("2011-01-01T10:00:00+02:00").unwrap();
        assert_eq!(token.base, utc("2011-01-01T08:00:00Z"));
        let zulu = DateToken::parse("2011-01-01T10:00:00Z").unwrap();
        assert_eq!(zulu.base, utc("2011-01-01T10:00:00Z"));
    }

    #[test]
    fn test_fraction_truncated_to_millis() {
        let token = DateToken::parse("2011-01-01T10:00:00.1234").unwrap();
        assert_eq!(token.base, utc("2011-01-01T10:00:00.123Z"));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        for bad in ["", "20", "2011-13", "2011-02-30", "2011-01-01T25:00", "yesterday"] {
            let err = DateToken::parse(bad).unwrap_err();
            assert!(err.is_invalid_request(), "{}", bad);
        }
    }

    #[test]
    fn test_single_eq_covers_precision_window() {
        let range = DateRange::parse(&["2011-01-01"]).unwrap();
        assert_eq!(range.lower, Some(utc("2011-01-01T00:00:00Z")));
        assert_eq!(range.upper, Some(utc("2011-01-02T00:00:00Z")));
    }

    #[test]
    fn test_starts_after_and_ends_before() {
        let sa = DateRange::parse(&["sa2011"]).unwrap();
        assert_eq!(sa.lower, Some(utc("2012-01-01T00:00:00Z")));
        assert_eq!(sa.upper, None);

        let eb = DateRange::parse(&["eb2011"]).unwrap();
        assert_eq!(eb.lower, None);
        assert_eq!(eb.upper, Some(utc("2011-01-01T00:00:00Z")));
    }

    #[test]
    fn test_two_lower_bounds_rejected() {
        let err = DateRange::parse(&["ge2011", "gt2012"]).unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::parse(&["ge2013", "lt2012"]).unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_second_precision_le() {
        let range = DateRange::parse(&["le2011-01-01T10:00:00"]).unwrap();
        assert_eq!(range.upper, Some(utc("2011-01-01T10:00:01Z")));
        assert_eq!(
            range.upper_bound_as_instant(),
            Some(utc("2011-01-01T10:00:00.999Z"))
        );
    }

    #[test]
    fn test_negative_units() {
        let token = DateToken::parse("2011-03").unwrap();
        assert_eq!(token.shifted(-1).unwrap(), utc("2011-02-01T00:00:00Z"));
        let year = DateToken::parse("2011").unwrap();
        assert_eq!(year.shifted(-1).unwrap(), utc("2010-01-01T00:00:00Z"));
    }
}
