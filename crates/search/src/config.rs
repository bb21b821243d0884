//! Search configuration.
//!
//! Supports programmatic construction and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCH_DISABLE_HASH_BASED_SEARCHES` | false | Compare resource type and parameter name literally |
//! | `SEARCH_INCLUDE_PARTITION_IN_HASHES` | false | Fold the partition id into index hashes |
//! | `SEARCH_DEFAULT_PAGE_SIZE` | 20 | Default page size (0 = none configured) |
//! | `SEARCH_MAX_PAGE_SIZE` | 1000 | Largest page the paging cache will serve |
//! | `SEARCH_STORE_RESULTS` | true | Retain result sets for cursor paging |
//! | `SEARCH_OFFSET_MODE_HISTORY` | false | Page history requests by offset |
//!
//! # Example
//!
//! ```rust
//! use helios_search::SearchConfig;
//!
//! // Create from environment
//! let config = SearchConfig::from_env();
//!
//! // Or create programmatically
//! let config = SearchConfig {
//!     disable_hash_based_searches: true,
//!     default_page_size: 50,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;

/// Configuration for predicate compilation and result paging.
#[derive(Debug, Clone, Parser)]
#[command(name = "helios-search")]
#[command(about = "FHIR search compilation and paging settings")]
pub struct SearchConfig {
    /// Use literal resource type / parameter name comparisons instead of identity hashes.
    #[arg(long, env = "SEARCH_DISABLE_HASH_BASED_SEARCHES", default_value = "false")]
    pub disable_hash_based_searches: bool,

    /// Include the partition id in identity and presence hashes.
    #[arg(long, env = "SEARCH_INCLUDE_PARTITION_IN_HASHES", default_value = "false")]
    pub include_partition_in_hashes: bool,

    /// Default page size for search results (0 means no default).
    #[arg(long, env = "SEARCH_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: usize,

    /// Maximum page size for retained search results.
    #[arg(long, env = "SEARCH_MAX_PAGE_SIZE", default_value = "1000")]
    pub max_page_size: usize,

    /// Retain result sets so that later pages can be served by search id.
    #[arg(long, env = "SEARCH_STORE_RESULTS", default_value = "true")]
    pub store_search_results: bool,

    /// Page history requests by absolute offset.
    #[arg(long, env = "SEARCH_OFFSET_MODE_HISTORY", default_value = "false")]
    pub offset_mode_history: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            disable_hash_based_searches: false,
            include_partition_in_hashes: false,
            default_page_size: 20,
            max_page_size: 1000,
            store_search_results: true,
            offset_mode_history: false,
        }
    }
}

impl SearchConfig {
    /// Creates a configuration from environment variables only.
    pub fn from_env() -> Self {
        Self::try_parse_from(["helios-search"]).unwrap_or_default()
    }

    /// Returns the configured default page size, if any.
    pub fn default_page_size(&self) -> Option<usize> {
        (self.default_page_size > 0).then_some(self.default_page_size)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_page_size == 0 {
            errors.push("Max page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert!(!config.disable_hash_based_searches);
        assert!(config.store_search_results);
        assert_eq!(config.default_page_size(), Some(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_default_page_size_means_none() {
        let config = SearchConfig {
            default_page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.default_page_size(), None);
    }

    #[test]
    fn test_validate_rejects_inverted_sizes() {
        let config = SearchConfig {
            default_page_size: 500,
            max_page_size: 100,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_parse_from_args() {
        let config = SearchConfig::try_parse_from([
            "helios-search",
            "--default-page-size",
            "50",
            "--max-page-size",
            "200",
        ])
        .unwrap();
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_page_size, 200);
    }
}
