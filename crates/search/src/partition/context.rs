//! Request partition scope.
//!
//! This module defines [`RequestPartition`], the partition a request is scoped to,
//! and [`PartitionSettings`], the server-wide partitioning behaviour.
//!
//! Whether a request carries a partition at all is modelled with `Option`:
//!
//! | Value | Meaning | Predicate |
//! |-------|---------|-----------|
//! | `None` | server is unpartitioned | none |
//! | `Some(RequestPartition { partition_id: None })` | the default ("no") partition | `partition_id IS NULL` |
//! | `Some(RequestPartition { partition_id: Some(n) })` | partition `n` | `partition_id = n` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;

/// The partition a request is scoped to.
///
/// # Examples
///
/// ```
/// use helios_search::partition::RequestPartition;
///
/// let tenant = RequestPartition::with_id(7);
/// assert_eq!(tenant.partition_id(), Some(7));
///
/// let default = RequestPartition::default_partition();
/// assert!(default.is_default());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestPartition {
    /// The partition id. `None` is the explicit default partition.
    pub partition_id: Option<i32>,
}

impl RequestPartition {
    /// Creates a request partition for a concrete partition id.
    pub fn with_id(partition_id: i32) -> Self {
        Self {
            partition_id: Some(partition_id),
        }
    }

    /// Creates a request partition for the default (null) partition.
    pub fn default_partition() -> Self {
        Self { partition_id: None }
    }

    /// Returns the partition id, if any.
    pub fn partition_id(&self) -> Option<i32> {
        self.partition_id
    }

    /// Returns `true` if this is the default (null) partition.
    pub fn is_default(&self) -> bool {
        self.partition_id.is_none()
    }
}

impl fmt::Display for RequestPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.partition_id {
            Some(id) => write!(f, "partition {}", id),
            None => write!(f, "default partition"),
        }
    }
}

/// Server-wide partitioning behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSettings {
    /// Whether the partition id is folded into identity and presence hashes.
    pub include_partition_in_search_hashes: bool,
}

impl PartitionSettings {
    /// Creates settings that fold the partition id into hashes.
    pub fn including_partition_in_hashes() -> Self {
        Self {
            include_partition_in_search_hashes: true,
        }
    }
}

impl From<&SearchConfig> for PartitionSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            include_partition_in_search_hashes: config.include_partition_in_hashes,
        }
    }
}
