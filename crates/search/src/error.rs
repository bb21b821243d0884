//! Error types for search compilation and result paging.
//!
//! Errors fall into three groups:
//!
//! - **Invalid criteria** - the request itself is wrong (bad date token,
//!   unsupported prefix). These are surfaced to the caller as a rejected request.
//! - **Data integrity** - the data layer returned something it never should.
//!   These abort the request.
//! - **Provider** - an external collaborator (match provider, paging cache)
//!   failed.
//!
//! Degraded paging and stale (null) result entries are recovered locally and
//! never appear here.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::{SearchParamType, SearchPrefix};

/// The error type for all search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Generic malformed criterion.
    #[error("invalid search criteria: {message}")]
    InvalidCriteria { message: String },

    /// A prefix that the parameter type cannot honour.
    #[error("invalid prefix '{prefix}' for {param_type} parameter value: {value}")]
    UnsupportedPrefix {
        prefix: SearchPrefix,
        param_type: SearchParamType,
        value: String,
    },

    /// A date/time token that could not be parsed.
    #[error("invalid date/time value '{value}': {message}")]
    InvalidDate { value: String, message: String },

    /// A numeric token that could not be parsed.
    #[error("invalid numeric value: {value}")]
    InvalidNumber { value: String },

    /// A returned resource has no identity and is not an outcome resource.
    #[error("server method returned resource of type [{resource_type}] with no ID specified: {message}")]
    DataIntegrity {
        resource_type: String,
        message: String,
    },

    /// An external collaborator failed.
    #[error("result provider error: {message}")]
    Provider { message: String },
}

impl SearchError {
    /// Creates an [`SearchError::InvalidCriteria`] with the given message.
    pub fn invalid(message: impl Into<String>) -> Self {
        SearchError::InvalidCriteria {
            message: message.into(),
        }
    }

    /// Creates a [`SearchError::Provider`] with the given message.
    pub fn provider(message: impl Into<String>) -> Self {
        SearchError::Provider {
            message: message.into(),
        }
    }

    /// Returns true if this error is the caller's fault (HTTP 400 territory).
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidCriteria { .. }
                | SearchError::UnsupportedPrefix { .. }
                | SearchError::InvalidDate { .. }
                | SearchError::InvalidNumber { .. }
        )
    }

    /// Returns true if this error signals an internal defect.
    pub fn is_internal(&self) -> bool {
        !self.is_invalid_request()
    }
}

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_prefix_display() {
        let err = SearchError::UnsupportedPrefix {
            prefix: SearchPrefix::Sa,
            param_type: SearchParamType::Quantity,
            value: "sa5.4|http://unitsofmeasure.org|mg".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'sa'"));
        assert!(msg.contains("quantity"));
        assert!(msg.contains("sa5.4|http://unitsofmeasure.org|mg"));
    }

    #[test]
    fn test_classification() {
        assert!(SearchError::invalid("bad").is_invalid_request());
        assert!(
            SearchError::InvalidDate {
                value: "20x1".to_string(),
                message: "no".to_string(),
            }
            .is_invalid_request()
        );

        let integrity = SearchError::DataIntegrity {
            resource_type: "Patient".to_string(),
            message: "missing id".to_string(),
        };
        assert!(integrity.is_internal());
        assert!(SearchError::provider("down").is_internal());
    }

    #[test]
    fn test_data_integrity_display() {
        let err = SearchError::DataIntegrity {
            resource_type: "Observation".to_string(),
            message: "entry 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "server method returned resource of type [Observation] with no ID specified: entry 3"
        );
    }
}
