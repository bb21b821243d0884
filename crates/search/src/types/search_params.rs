//! FHIR search parameter types.
//!
//! This module defines types for representing FHIR search criteria,
//! including parameter types, modifiers, and prefixes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::partition::RequestPartition;
use crate::types::RequestedPage;

/// FHIR search parameter types understood by the compiler.
///
/// The set is closed: every compilation step matches on it exhaustively.
///
/// See: https://build.fhir.org/search.html#ptypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParamType {
    /// A date, dateTime, instant or period.
    Date,
    /// A plain decimal number.
    Number,
    /// A quantity, with a number and units.
    Quantity,
    /// A reference to another resource.
    Reference,
    /// A simple string, like a name or description.
    String,
    /// A search against a URI.
    Uri,
    /// A code from a code system or value set.
    Token,
    /// A geographic position (`lat|long`).
    Coords,
}

impl fmt::Display for SearchParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchParamType::Date => write!(f, "date"),
            SearchParamType::Number => write!(f, "number"),
            SearchParamType::Quantity => write!(f, "quantity"),
            SearchParamType::Reference => write!(f, "reference"),
            SearchParamType::String => write!(f, "string"),
            SearchParamType::Uri => write!(f, "uri"),
            SearchParamType::Token => write!(f, "token"),
            SearchParamType::Coords => write!(f, "coords"),
        }
    }
}

impl FromStr for SearchParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SearchParamType::Date),
            "number" => Ok(SearchParamType::Number),
            "quantity" => Ok(SearchParamType::Quantity),
            "reference" => Ok(SearchParamType::Reference),
            "string" => Ok(SearchParamType::String),
            "uri" => Ok(SearchParamType::Uri),
            "token" => Ok(SearchParamType::Token),
            "coords" | "special" => Ok(SearchParamType::Coords),
            _ => Err(format!("unknown search parameter type: {}", s)),
        }
    }
}

/// Search modifiers that affect predicate compilation.
///
/// See: https://build.fhir.org/search.html#modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchModifier {
    /// Exact string match (string parameters).
    Exact,
    /// Contains substring (string parameters).
    Contains,
    /// Negation of the value predicate (token parameters).
    Not,
    /// Match on presence/absence of the parameter (`true` = missing).
    Missing,
    /// Restrict a reference to a target type (e.g. `subject:Patient`).
    Type(String),
}

impl fmt::Display for SearchModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchModifier::Exact => write!(f, "exact"),
            SearchModifier::Contains => write!(f, "contains"),
            SearchModifier::Not => write!(f, "not"),
            SearchModifier::Missing => write!(f, "missing"),
            SearchModifier::Type(t) => write!(f, "{}", t),
        }
    }
}

impl SearchModifier {
    /// Parses a modifier string, returning None for unknown modifiers.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exact" => Some(SearchModifier::Exact),
            "contains" => Some(SearchModifier::Contains),
            "not" => Some(SearchModifier::Not),
            "missing" => Some(SearchModifier::Missing),
            _ => {
                // Resource type modifier
                if s.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    Some(SearchModifier::Type(s.to_string()))
                } else {
                    None
                }
            }
        }
    }

    /// Returns true if this modifier is valid for the given parameter type.
    pub fn is_valid_for(&self, param_type: SearchParamType) -> bool {
        match self {
            SearchModifier::Exact | SearchModifier::Contains => {
                param_type == SearchParamType::String
            }
            SearchModifier::Not => param_type == SearchParamType::Token,
            SearchModifier::Missing => true,
            SearchModifier::Type(_) => param_type == SearchParamType::Reference,
        }
    }
}

/// Comparison prefixes for search values.
///
/// See: https://build.fhir.org/search.html#prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchPrefix {
    /// Equal (default).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
    /// Starts after.
    Sa,
    /// Ends before.
    Eb,
    /// Approximately equal.
    Ap,
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" | "=" => Ok(SearchPrefix::Eq),
            "ne" | "!=" => Ok(SearchPrefix::Ne),
            "gt" | ">" => Ok(SearchPrefix::Gt),
            "lt" | "<" => Ok(SearchPrefix::Lt),
            "ge" | ">=" => Ok(SearchPrefix::Ge),
            "le" | "<=" => Ok(SearchPrefix::Le),
            "sa" => Ok(SearchPrefix::Sa),
            "eb" => Ok(SearchPrefix::Eb),
            "ap" | "~" => Ok(SearchPrefix::Ap),
            _ => Err(format!("unknown search prefix: {}", s)),
        }
    }
}

impl SearchPrefix {
    /// Returns the two-letter query form of the prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchPrefix::Eq => "eq",
            SearchPrefix::Ne => "ne",
            SearchPrefix::Gt => "gt",
            SearchPrefix::Lt => "lt",
            SearchPrefix::Ge => "ge",
            SearchPrefix::Le => "le",
            SearchPrefix::Sa => "sa",
            SearchPrefix::Eb => "eb",
            SearchPrefix::Ap => "ap",
        }
    }

    /// Extracts a prefix from the beginning of a value string.
    ///
    /// Both the two-letter form (`ge2011`) and the legacy symbolic form
    /// (`>=2011`) are accepted. Returns the prefix and the remaining value.
    pub fn extract(value: &str) -> (Self, &str) {
        for symbol in [">=", "<=", "!="] {
            if let Some(rest) = value.strip_prefix(symbol) {
                if let Ok(p) = symbol.parse() {
                    return (p, rest);
                }
            }
        }
        for symbol in [">", "<", "=", "~"] {
            if let Some(rest) = value.strip_prefix(symbol) {
                if let Ok(p) = symbol.parse() {
                    return (p, rest);
                }
            }
        }
        if value.len() >= 2 && value.is_char_boundary(2) {
            let (prefix, rest) = value.split_at(2);
            // Only a letter prefix followed by a digit/sign counts, so "ne" in "network" is left alone
            let next_is_value = rest
                .chars()
                .next()
                .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
                .unwrap_or(false);
            if next_is_value {
                if let Ok(p) = prefix.parse() {
                    return (p, rest);
                }
            }
        }
        (SearchPrefix::Eq, value)
    }

    /// Returns true if this prefix bounds a range from below.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, SearchPrefix::Gt | SearchPrefix::Ge | SearchPrefix::Sa)
    }

    /// Returns true if this prefix is valid for the given parameter type.
    pub fn is_valid_for(&self, param_type: SearchParamType) -> bool {
        match self {
            SearchPrefix::Eq => true,
            SearchPrefix::Ne
            | SearchPrefix::Gt
            | SearchPrefix::Lt
            | SearchPrefix::Ge
            | SearchPrefix::Le
            | SearchPrefix::Ap => matches!(
                param_type,
                SearchParamType::Number | SearchParamType::Date | SearchParamType::Quantity
            ),
            SearchPrefix::Sa | SearchPrefix::Eb => param_type == SearchParamType::Date,
        }
    }
}

/// A single search value with its comparison prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchValue {
    /// The comparison prefix.
    pub prefix: SearchPrefix,

    /// The value to search for, without prefix.
    pub value: String,
}

impl SearchValue {
    /// Creates a new search value with the given prefix and value.
    pub fn new(prefix: SearchPrefix, value: impl Into<String>) -> Self {
        Self {
            prefix,
            value: value.into(),
        }
    }

    /// Creates a search value with the default (eq) prefix.
    pub fn eq(value: impl Into<String>) -> Self {
        Self::new(SearchPrefix::Eq, value)
    }

    /// Parses a value string, extracting any prefix.
    pub fn parse(s: &str) -> Self {
        let (prefix, value) = SearchPrefix::extract(s);
        Self::new(prefix, value)
    }

    /// Returns the value as it would appear in a query string.
    ///
    /// The default `eq` prefix is omitted.
    pub fn to_query_token(&self) -> String {
        match self.prefix {
            SearchPrefix::Eq => self.value.clone(),
            other => format!("{}{}", other, self.value),
        }
    }
}

impl fmt::Display for SearchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_token())
    }
}

/// All values supplied for one logical search parameter.
///
/// Each value is one search criterion; values are ORed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParameter {
    /// The parameter name (e.g., "birthdate", "identifier").
    pub name: String,

    /// The parameter type.
    pub param_type: SearchParamType,

    /// Modifier, if any.
    pub modifier: Option<SearchModifier>,

    /// The search value(s). Multiple values are ORed.
    pub values: Vec<SearchValue>,
}

impl SearchParameter {
    /// Creates a parameter with no modifier.
    pub fn new(name: impl Into<String>, param_type: SearchParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            modifier: None,
            values: Vec::new(),
        }
    }

    /// Adds a value.
    pub fn with_value(mut self, value: SearchValue) -> Self {
        self.values.push(value);
        self
    }

    /// Parses and adds each raw query token as a value.
    ///
    /// Prefixes are only recognised for ordered types (date, number, quantity);
    /// for every other type the token is taken verbatim.
    pub fn with_tokens<'a>(mut self, tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let ordered = matches!(
            self.param_type,
            SearchParamType::Date | SearchParamType::Number | SearchParamType::Quantity
        );
        self.values.extend(tokens.into_iter().map(|token| {
            if ordered {
                SearchValue::parse(token)
            } else {
                SearchValue::eq(token)
            }
        }));
        self
    }

    /// Sets the modifier.
    pub fn with_modifier(mut self, modifier: SearchModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Returns true if this is a `:missing` search.
    pub fn is_missing_search(&self) -> bool {
        matches!(self.modifier, Some(SearchModifier::Missing))
    }
}

/// A complete set of search criteria for one resource type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The resource type being searched.
    pub resource_type: String,

    /// Search parameters. Different parameters are ANDed.
    pub parameters: Vec<SearchParameter>,

    /// The partition the request is scoped to, if the server is partitioned.
    pub partition: Option<RequestPartition>,

    /// Result count limit (_count).
    pub count: Option<usize>,

    /// Offset for pagination (_offset).
    pub offset: Option<usize>,
}

impl SearchQuery {
    /// Creates a new search query for the given resource type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    /// Adds a search parameter.
    pub fn with_parameter(mut self, param: SearchParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Scopes the query to a partition.
    pub fn with_partition(mut self, partition: RequestPartition) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Sets the count limit.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the explicit offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns the paging window requested by the caller.
    pub fn requested_page(&self) -> RequestedPage {
        RequestedPage {
            offset: self.offset,
            limit: self.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_param_type_display() {
        assert_eq!(SearchParamType::Quantity.to_string(), "quantity");
        assert_eq!(SearchParamType::Token.to_string(), "token");
        assert_eq!(SearchParamType::Coords.to_string(), "coords");
    }

    #[test]
    fn test_search_param_type_parse() {
        assert_eq!(
            "DATE".parse::<SearchParamType>().unwrap(),
            SearchParamType::Date
        );
        assert!("composite".parse::<SearchParamType>().is_err());
    }

    #[test]
    fn test_search_modifier_parse() {
        assert_eq!(SearchModifier::parse("missing"), Some(SearchModifier::Missing));
        assert_eq!(
            SearchModifier::parse("Patient"),
            Some(SearchModifier::Type("Patient".to_string()))
        );
        assert_eq!(SearchModifier::parse("unknown"), None);
    }

    #[test]
    fn test_search_modifier_validity() {
        assert!(SearchModifier::Exact.is_valid_for(SearchParamType::String));
        assert!(!SearchModifier::Exact.is_valid_for(SearchParamType::Token));
        assert!(SearchModifier::Missing.is_valid_for(SearchParamType::Date));
        assert!(SearchModifier::Type("Patient".into()).is_valid_for(SearchParamType::Reference));
    }

    #[test]
    fn test_search_prefix_extract() {
        assert_eq!(
            SearchPrefix::extract("gt2020-01-01"),
            (SearchPrefix::Gt, "2020-01-01")
        );
        assert_eq!(
            SearchPrefix::extract("2020-01-01"),
            (SearchPrefix::Eq, "2020-01-01")
        );
        assert_eq!(SearchPrefix::extract("le100"), (SearchPrefix::Le, "100"));
        assert_eq!(SearchPrefix::extract(">=2011"), (SearchPrefix::Ge, "2011"));
        assert_eq!(SearchPrefix::extract(">2011"), (SearchPrefix::Gt, "2011"));
        assert_eq!(SearchPrefix::extract("<=2013"), (SearchPrefix::Le, "2013"));
        assert_eq!(SearchPrefix::extract("<2012"), (SearchPrefix::Lt, "2012"));
    }

    #[test]
    fn test_search_prefix_leaves_words_alone() {
        assert_eq!(SearchPrefix::extract("network"), (SearchPrefix::Eq, "network"));
        assert_eq!(SearchPrefix::extract("eb"), (SearchPrefix::Eq, "eb"));
    }

    #[test]
    fn test_search_prefix_validity() {
        assert!(SearchPrefix::Gt.is_valid_for(SearchParamType::Number));
        assert!(!SearchPrefix::Gt.is_valid_for(SearchParamType::String));
        assert!(SearchPrefix::Sa.is_valid_for(SearchParamType::Date));
        assert!(!SearchPrefix::Sa.is_valid_for(SearchParamType::Quantity));
    }

    #[test]
    fn test_search_value_query_token() {
        assert_eq!(SearchValue::parse("gt100").to_query_token(), "gt100");
        assert_eq!(SearchValue::parse("Smith").to_query_token(), "Smith");
        assert_eq!(SearchValue::parse(">=2011").to_string(), "ge2011");
    }

    #[test]
    fn test_with_tokens_only_parses_ordered_prefixes() {
        let number = SearchParameter::new("probability", SearchParamType::Number)
            .with_tokens(["gt0.5", "lt0.1"]);
        assert_eq!(number.values[0].prefix, SearchPrefix::Gt);
        assert_eq!(number.values[1].value, "0.1");

        let string = SearchParameter::new("family", SearchParamType::String)
            .with_tokens(["ne5"]);
        assert_eq!(string.values[0], SearchValue::eq("ne5"));
    }

    #[test]
    fn test_search_query_requested_page() {
        let query = SearchQuery::new("Patient").with_count(10).with_offset(20);
        let page = query.requested_page();
        assert_eq!(page.offset, Some(20));
        assert_eq!(page.limit, Some(10));
    }
}
