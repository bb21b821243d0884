//! Stable hashes for search index rows.
//!
//! Index rows carry precomputed hashes so that a single equality replaces
//! several string comparisons. The hashes must be identical at write time and
//! query time, across processes and releases, so they are derived from SHA-256
//! rather than `std::hash`.

use sha2::{Digest, Sha256};

use super::context::{PartitionSettings, RequestPartition};

/// Separator fed between hashed values so that ("ab", "c") != ("a", "bc").
const DELIMITER: &[u8] = &[0x00, 0x1f];

/// Hash of (partition, resource type, parameter name) stored on every index row.
pub fn hash_identity(
    settings: &PartitionSettings,
    partition: Option<&RequestPartition>,
    resource_type: &str,
    param_name: &str,
) -> i64 {
    hash(settings, partition, &[resource_type, param_name])
}

/// Hash of (partition, resource type, parameter name, present flag) stored on
/// presence rows.
pub fn hash_presence(
    settings: &PartitionSettings,
    partition: Option<&RequestPartition>,
    resource_type: &str,
    param_name: &str,
    present: bool,
) -> i64 {
    let flag = if present { "true" } else { "false" };
    hash(settings, partition, &[resource_type, param_name, flag])
}

fn hash(
    settings: &PartitionSettings,
    partition: Option<&RequestPartition>,
    values: &[&str],
) -> i64 {
    let mut hasher = Sha256::new();

    if settings.include_partition_in_search_hashes {
        if let Some(id) = partition.and_then(RequestPartition::partition_id) {
            hasher.update(id.to_be_bytes());
        }
    }

    for value in values {
        hasher.update(value.as_bytes());
        hasher.update(DELIMITER);
    }

    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_hash_is_stable() {
        let settings = PartitionSettings::default();
        let a = hash_identity(&settings, None, "Patient", "birthdate");
        let b = hash_identity(&settings, None, "Patient", "birthdate");
        assert_eq!(a, b);
        assert_ne!(a, hash_identity(&settings, None, "Patient", "death-date"));
    }

    #[test]
    fn test_delimiter_separates_values() {
        let settings = PartitionSettings::default();
        assert_ne!(
            hash_identity(&settings, None, "Patientb", "irthdate"),
            hash_identity(&settings, None, "Patient", "birthdate")
        );
    }

    #[test]
    fn test_partition_ignored_unless_configured() {
        let partition = RequestPartition::with_id(4);
        let plain = PartitionSettings::default();
        assert_eq!(
            hash_identity(&plain, Some(&partition), "Patient", "name"),
            hash_identity(&plain, None, "Patient", "name")
        );

        let folded = PartitionSettings::including_partition_in_hashes();
        assert_ne!(
            hash_identity(&folded, Some(&partition), "Patient", "name"),
            hash_identity(&folded, None, "Patient", "name")
        );
        // The default partition has no id to fold in
        assert_eq!(
            hash_identity(
                &folded,
                Some(&RequestPartition::default_partition()),
                "Patient",
                "name"
            ),
            hash_identity(&folded, None, "Patient", "name")
        );
    }

    #[test]
    fn test_presence_hash_depends_on_flag() {
        let settings = PartitionSettings::default();
        assert_ne!(
            hash_presence(&settings, None, "Observation", "subject", true),
            hash_presence(&settings, None, "Observation", "subject", false)
        );
    }
}
