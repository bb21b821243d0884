//! Index joins and the query root that owns them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::SearchParamType;

use super::node::{ColumnRef, PredicateNode};

/// Opaque handle to a join owned by a [`QueryRoot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinHandle(u32);

impl JoinHandle {
    /// Creates a handle with the given ordinal.
    pub fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    /// Returns the ordinal of the join within its query.
    pub fn ordinal(&self) -> u32 {
        self.0
    }

    /// Returns a reference to a column of the joined table.
    pub fn column(self, column: IndexColumn) -> ColumnRef {
        ColumnRef::new(self, column)
    }
}

impl fmt::Display for JoinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "j{}", self.0)
    }
}

/// The per-type index tables a predicate can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexTable {
    /// Date/period ranges.
    Date,
    /// Decimal numbers.
    Number,
    /// Quantities (value + system + code).
    Quantity,
    /// Resource-to-resource links.
    ResourceLink,
    /// Normalized and exact strings.
    String,
    /// URIs.
    Uri,
    /// Coded values.
    Token,
    /// Latitude/longitude pairs.
    Coords,
    /// Presence markers for reference parameters.
    SearchParamPresent,
}

impl IndexTable {
    /// Returns the table holding index rows for the given parameter type.
    pub fn for_param_type(param_type: SearchParamType) -> Self {
        match param_type {
            SearchParamType::Date => IndexTable::Date,
            SearchParamType::Number => IndexTable::Number,
            SearchParamType::Quantity => IndexTable::Quantity,
            SearchParamType::Reference => IndexTable::ResourceLink,
            SearchParamType::String => IndexTable::String,
            SearchParamType::Uri => IndexTable::Uri,
            SearchParamType::Token => IndexTable::Token,
            SearchParamType::Coords => IndexTable::Coords,
        }
    }

    /// Returns the table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexTable::Date => "spidx_date",
            IndexTable::Number => "spidx_number",
            IndexTable::Quantity => "spidx_quantity",
            IndexTable::ResourceLink => "resource_link",
            IndexTable::String => "spidx_string",
            IndexTable::Uri => "spidx_uri",
            IndexTable::Token => "spidx_token",
            IndexTable::Coords => "spidx_coords",
            IndexTable::SearchParamPresent => "search_param_present",
        }
    }

    /// Returns true if rows of this table carry a `missing` flag.
    pub fn has_missing_column(&self) -> bool {
        !matches!(
            self,
            IndexTable::ResourceLink | IndexTable::SearchParamPresent
        )
    }
}

impl fmt::Display for IndexTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns of the index tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexColumn {
    /// Hash of (partition, resource type, parameter name).
    HashIdentity,
    /// Hash of (partition, resource type, parameter name, present).
    HashPresence,
    /// Partition the row belongs to.
    PartitionId,
    /// Literal resource type.
    ResourceType,
    /// Literal parameter name.
    ParamName,
    /// Whether the row marks the parameter as absent.
    Missing,
    /// Inclusive lower bound of a date range.
    ValueLow,
    /// Exclusive upper bound of a date range.
    ValueHigh,
    /// Decimal value of a number or quantity.
    ValueNumber,
    /// Quantity system.
    System,
    /// Quantity unit code.
    Units,
    /// Normalized (accent- and case-folded) string.
    ValueNormalized,
    /// String exactly as indexed.
    ValueExact,
    /// URI value.
    Uri,
    /// Token system.
    TokenSystem,
    /// Token code.
    TokenValue,
    /// Type of the referenced resource.
    TargetResourceType,
    /// Id of the referenced resource.
    TargetResourceId,
    /// Absolute URL of an external reference.
    TargetResourceUrl,
    /// Latitude.
    Latitude,
    /// Longitude.
    Longitude,
}

impl IndexColumn {
    /// Returns the column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexColumn::HashIdentity => "hash_identity",
            IndexColumn::HashPresence => "hash_presence",
            IndexColumn::PartitionId => "partition_id",
            IndexColumn::ResourceType => "res_type",
            IndexColumn::ParamName => "sp_name",
            IndexColumn::Missing => "sp_missing",
            IndexColumn::ValueLow => "value_low",
            IndexColumn::ValueHigh => "value_high",
            IndexColumn::ValueNumber => "value_number",
            IndexColumn::System => "system",
            IndexColumn::Units => "units",
            IndexColumn::ValueNormalized => "value_normalized",
            IndexColumn::ValueExact => "value_exact",
            IndexColumn::Uri => "uri",
            IndexColumn::TokenSystem => "token_system",
            IndexColumn::TokenValue => "token_value",
            IndexColumn::TargetResourceType => "target_resource_type",
            IndexColumn::TargetResourceId => "target_resource_id",
            IndexColumn::TargetResourceUrl => "target_resource_url",
            IndexColumn::Latitude => "latitude",
            IndexColumn::Longitude => "longitude",
        }
    }
}

impl fmt::Display for IndexColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the logical join for one search parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinKey {
    /// The parameter name.
    pub param_name: String,
    /// The parameter type.
    pub param_type: SearchParamType,
}

impl JoinKey {
    /// Creates a join key.
    pub fn new(param_name: impl Into<String>, param_type: SearchParamType) -> Self {
        Self {
            param_name: param_name.into(),
            param_type,
        }
    }
}

/// One join against an index table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexJoin {
    /// Handle predicates use to reference this join.
    pub handle: JoinHandle,
    /// The table joined.
    pub table: IndexTable,
    /// The parameter the join serves, if it is shared per parameter.
    pub key: Option<JoinKey>,
}

/// Owns the joins and root-level predicates of one compiled query.
///
/// Joins are held in an arena and referenced by [`JoinHandle`]. Parameter
/// joins are deduplicated by [`JoinKey`], so every predicate on the same
/// (name, type) pair reads the same rows.
#[derive(Debug, Default)]
pub struct QueryRoot {
    joins: Vec<IndexJoin>,
    by_key: HashMap<JoinKey, JoinHandle>,
    predicates: Vec<PredicateNode>,
    has_index_joins: bool,
}

impl QueryRoot {
    /// Creates an empty query root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the join for a parameter, creating it on first use.
    pub fn get_or_create_join(&mut self, key: JoinKey) -> JoinHandle {
        if let Some(handle) = self.by_key.get(&key) {
            return *handle;
        }
        let table = IndexTable::for_param_type(key.param_type);
        let handle = self.push_join(table, Some(key.clone()));
        tracing::debug!(
            join = %handle,
            table = %table,
            param = %key.param_name,
            "Created index join"
        );
        self.by_key.insert(key, handle);
        handle
    }

    /// Adds a join that is never shared.
    pub fn add_join(&mut self, table: IndexTable) -> JoinHandle {
        let handle = self.push_join(table, None);
        tracing::debug!(join = %handle, table = %table, "Created unshared join");
        handle
    }

    fn push_join(&mut self, table: IndexTable, key: Option<JoinKey>) -> JoinHandle {
        let handle = JoinHandle::new(self.joins.len() as u32);
        self.joins.push(IndexJoin { handle, table, key });
        handle
    }

    /// Returns the join for a handle.
    pub fn join(&self, handle: JoinHandle) -> Option<&IndexJoin> {
        self.joins.get(handle.ordinal() as usize)
    }

    /// Returns all joins in creation order.
    pub fn joins(&self) -> &[IndexJoin] {
        &self.joins
    }

    /// Adds a predicate to the root conjunction.
    pub fn add_predicate(&mut self, predicate: PredicateNode) {
        if !predicate.is_trivially_true() {
            self.predicates.push(predicate);
        }
    }

    /// Records that the query reads index rows.
    pub fn set_has_index_joins(&mut self) {
        self.has_index_joins = true;
    }

    /// Returns true if any index join has been used.
    pub fn has_index_joins(&self) -> bool {
        self.has_index_joins
    }

    /// Consumes the root, returning the joins and the conjunction of all
    /// root predicates.
    pub fn into_parts(self) -> (Vec<IndexJoin>, PredicateNode, bool) {
        (
            self.joins,
            PredicateNode::all(self.predicates),
            self.has_index_joins,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_reused_per_key() {
        let mut root = QueryRoot::new();
        let a = root.get_or_create_join(JoinKey::new("date", SearchParamType::Date));
        let b = root.get_or_create_join(JoinKey::new("date", SearchParamType::Date));
        let c = root.get_or_create_join(JoinKey::new("code", SearchParamType::Token));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(root.joins().len(), 2);
        assert_eq!(root.join(c).map(|j| j.table), Some(IndexTable::Token));
    }

    #[test]
    fn test_unshared_joins_are_distinct() {
        let mut root = QueryRoot::new();
        let a = root.add_join(IndexTable::SearchParamPresent);
        let b = root.add_join(IndexTable::SearchParamPresent);
        assert_ne!(a, b);
        assert!(root.join(a).and_then(|j| j.key.as_ref()).is_none());
    }

    #[test]
    fn test_into_parts_drops_trivial_predicates() {
        let mut root = QueryRoot::new();
        root.add_predicate(PredicateNode::all(Vec::new()));
        let (joins, predicate, has_index_joins) = root.into_parts();
        assert!(joins.is_empty());
        assert!(predicate.is_trivially_true());
        assert!(!has_index_joins);
    }

    #[test]
    fn test_table_for_param_type() {
        assert_eq!(
            IndexTable::for_param_type(SearchParamType::Reference),
            IndexTable::ResourceLink
        );
        assert!(!IndexTable::ResourceLink.has_missing_column());
        assert!(IndexTable::Quantity.has_missing_column());
    }
}
