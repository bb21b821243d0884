//! Identity, partition and presence predicates.
//!
//! Every index row belongs to one (partition, resource type, parameter name)
//! triple. The builder here produces the predicates selecting those rows:
//!
//! - **Hash strategy** (default): a single equality on `hash_identity`.
//! - **Literal strategy** (`disable_hash_based_searches`): equalities on the
//!   resource type and parameter name columns.
//!
//! Both are preceded by the partition predicate when the request is
//! partitioned.

use crate::config::SearchConfig;
use crate::partition::{PartitionSettings, RequestPartition, hash_identity, hash_presence};
use crate::predicate::{IndexColumn, IndexTable, JoinHandle, PredicateNode, QueryRoot};

/// Builds identity, partition and `:missing` predicates for one resource type.
#[derive(Debug, Clone)]
pub struct IdentityPredicateBuilder<'a> {
    resource_type: &'a str,
    partition: Option<RequestPartition>,
    settings: PartitionSettings,
    use_hashes: bool,
}

impl<'a> IdentityPredicateBuilder<'a> {
    /// Creates a builder for the given resource type and request partition.
    pub fn new(
        config: &SearchConfig,
        resource_type: &'a str,
        partition: Option<RequestPartition>,
    ) -> Self {
        Self {
            resource_type,
            partition,
            settings: PartitionSettings::from(config),
            use_hashes: !config.disable_hash_based_searches,
        }
    }

    /// Returns true if identity predicates use the hash strategy.
    pub fn uses_hashes(&self) -> bool {
        self.use_hashes
    }

    /// Partition predicate for a join, or `None` for an unpartitioned request.
    pub fn partition_predicate(&self, join: JoinHandle) -> Option<PredicateNode> {
        let partition = self.partition?;
        let column = join.column(IndexColumn::PartitionId);
        Some(match partition.partition_id() {
            Some(id) => PredicateNode::eq(column, id),
            None => PredicateNode::is_null(column),
        })
    }

    /// Predicate selecting the rows of `param_name` on a join.
    pub fn identity_predicate(&self, join: JoinHandle, param_name: &str) -> PredicateNode {
        if self.use_hashes {
            let hash = hash_identity(
                &self.settings,
                self.partition.as_ref(),
                self.resource_type,
                param_name,
            );
            PredicateNode::eq(join.column(IndexColumn::HashIdentity), hash)
        } else {
            PredicateNode::eq(join.column(IndexColumn::ResourceType), self.resource_type).and(
                PredicateNode::eq(join.column(IndexColumn::ParamName), param_name),
            )
        }
    }

    /// ANDs the partition and identity predicates with a value predicate.
    pub fn combine_with_identity(
        &self,
        join: JoinHandle,
        param_name: &str,
        value_predicate: PredicateNode,
    ) -> PredicateNode {
        let mut parts = Vec::with_capacity(3);
        parts.extend(self.partition_predicate(join));
        parts.push(self.identity_predicate(join, param_name));
        parts.push(value_predicate);
        PredicateNode::all(parts)
    }

    /// Adds a `:missing` predicate for a reference parameter.
    ///
    /// References have no row per absent value, so presence is tracked in a
    /// separate table keyed by a presence hash. Each call adds its own join.
    pub fn add_missing_for_reference(&self, root: &mut QueryRoot, param_name: &str, missing: bool) {
        let join = root.add_join(IndexTable::SearchParamPresent);
        let hash = hash_presence(
            &self.settings,
            self.partition.as_ref(),
            self.resource_type,
            param_name,
            !missing,
        );

        let mut parts = vec![PredicateNode::eq(join.column(IndexColumn::HashPresence), hash)];
        parts.extend(self.partition_predicate(join));

        root.set_has_index_joins();
        root.add_predicate(PredicateNode::all(parts));
    }

    /// Adds a `:missing` predicate for a non-reference parameter.
    ///
    /// Index tables for these types store a row with `missing = true` when the
    /// resource has no value, so the flag is compared on the parameter's join.
    pub fn add_missing_for_non_reference(
        &self,
        root: &mut QueryRoot,
        join: JoinHandle,
        param_name: &str,
        missing: bool,
    ) {
        let flag = PredicateNode::eq(join.column(IndexColumn::Missing), missing);
        let predicate = self.combine_with_identity(join, param_name, flag);

        root.set_has_index_joins();
        root.add_predicate(predicate);
    }
}
