//! Partition (tenant) scoping for search predicates.
//!
//! Every identity and presence predicate is scoped by the request's partition.
//! A partitioned server passes `Some(RequestPartition)`; an unpartitioned one
//! passes `None` and no partition predicate is emitted.
//!
//! # Examples
//!
//! ```
//! use helios_search::partition::{hash_identity, PartitionSettings, RequestPartition};
//!
//! let settings = PartitionSettings::including_partition_in_hashes();
//! let tenant_a = RequestPartition::with_id(1);
//! let tenant_b = RequestPartition::with_id(2);
//!
//! assert_ne!(
//!     hash_identity(&settings, Some(&tenant_a), "Patient", "name"),
//!     hash_identity(&settings, Some(&tenant_b), "Patient", "name"),
//! );
//! ```

mod context;
mod hash;

pub use context::{PartitionSettings, RequestPartition};
pub use hash::{hash_identity, hash_presence};
