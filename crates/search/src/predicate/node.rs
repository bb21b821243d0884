//! Backend-agnostic predicate tree.
//!
//! A [`PredicateNode`] is pure data: leaves compare an index column (reached
//! through a [`JoinHandle`]) with a literal. The storage engine decides how to
//! turn it into SQL, a document query or anything else.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::join::{IndexColumn, JoinHandle};

/// A column of an index table, reached through a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// The join the column belongs to.
    pub join: JoinHandle,
    /// The column.
    pub column: IndexColumn,
}

impl ColumnRef {
    /// Creates a column reference.
    pub fn new(join: JoinHandle, column: IndexColumn) -> Self {
        Self { join, column }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.join, self.column)
    }
}

/// Comparison operators for leaf predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// Pattern match with `%` wildcards.
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Like => "LIKE",
        };
        f.write_str(s)
    }
}

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateValue {
    /// 64-bit integer (hashes, partition ids).
    Integer(i64),
    /// Exact decimal.
    Decimal(Decimal),
    /// Text.
    String(String),
    /// Boolean flag.
    Bool(bool),
    /// Instant in UTC.
    Instant(DateTime<Utc>),
}

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateValue::Integer(i) => write!(f, "{}", i),
            PredicateValue::Decimal(d) => write!(f, "{}", d),
            PredicateValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            PredicateValue::Bool(b) => write!(f, "{}", b),
            PredicateValue::Instant(i) => {
                write!(f, "'{}'", i.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

impl From<i64> for PredicateValue {
    fn from(i: i64) -> Self {
        PredicateValue::Integer(i)
    }
}

impl From<i32> for PredicateValue {
    fn from(i: i32) -> Self {
        PredicateValue::Integer(i64::from(i))
    }
}

impl From<Decimal> for PredicateValue {
    fn from(d: Decimal) -> Self {
        PredicateValue::Decimal(d)
    }
}

impl From<&str> for PredicateValue {
    fn from(s: &str) -> Self {
        PredicateValue::String(s.to_string())
    }
}

impl From<String> for PredicateValue {
    fn from(s: String) -> Self {
        PredicateValue::String(s)
    }
}

impl From<bool> for PredicateValue {
    fn from(b: bool) -> Self {
        PredicateValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for PredicateValue {
    fn from(i: DateTime<Utc>) -> Self {
        PredicateValue::Instant(i)
    }
}

/// A node of the predicate tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateNode {
    /// All children must hold. An empty conjunction is true.
    And(Vec<PredicateNode>),
    /// Any child must hold. An empty disjunction is false.
    Or(Vec<PredicateNode>),
    /// The child must not hold.
    Not(Box<PredicateNode>),
    /// `column op value`
    Compare {
        /// Left-hand column.
        column: ColumnRef,
        /// Operator.
        op: CompareOp,
        /// Right-hand literal.
        value: PredicateValue,
    },
    /// `column IS NULL`
    IsNull(ColumnRef),
}

impl PredicateNode {
    /// Creates a comparison leaf.
    pub fn compare(column: ColumnRef, op: CompareOp, value: impl Into<PredicateValue>) -> Self {
        PredicateNode::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    /// Creates an equality leaf.
    pub fn eq(column: ColumnRef, value: impl Into<PredicateValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// Creates an `IS NULL` leaf.
    pub fn is_null(column: ColumnRef) -> Self {
        PredicateNode::IsNull(column)
    }

    /// Conjunction of the given nodes, flattening nested ANDs.
    ///
    /// A single node is returned unchanged.
    pub fn all(nodes: impl IntoIterator<Item = PredicateNode>) -> Self {
        let mut flat = Vec::new();
        for node in nodes {
            match node {
                PredicateNode::And(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            PredicateNode::And(flat)
        }
    }

    /// Disjunction of the given nodes, flattening nested ORs.
    ///
    /// A single node is returned unchanged.
    pub fn any(nodes: impl IntoIterator<Item = PredicateNode>) -> Self {
        let mut flat = Vec::new();
        for node in nodes {
            match node {
                PredicateNode::Or(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            PredicateNode::Or(flat)
        }
    }

    /// Combines with another node using AND.
    pub fn and(self, other: PredicateNode) -> Self {
        Self::all([self, other])
    }

    /// Combines with another node using OR.
    pub fn or(self, other: PredicateNode) -> Self {
        Self::any([self, other])
    }

    /// Negates this node.
    pub fn negate(self) -> Self {
        match self {
            PredicateNode::Not(inner) => *inner,
            other => PredicateNode::Not(Box::new(other)),
        }
    }

    /// Returns true if this node is the always-true empty conjunction.
    pub fn is_trivially_true(&self) -> bool {
        matches!(self, PredicateNode::And(children) if children.is_empty())
    }

    /// Visits every leaf of the tree in order.
    pub fn leaves(&self) -> Vec<&PredicateNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a PredicateNode>) {
        match self {
            PredicateNode::And(children) | PredicateNode::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            PredicateNode::Not(inner) => inner.collect_leaves(out),
            leaf => out.push(leaf),
        }
    }

    /// Returns every leaf comparing the given column, in order.
    pub fn comparisons_on(&self, column: IndexColumn) -> Vec<(CompareOp, &PredicateValue)> {
        self.leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                PredicateNode::Compare {
                    column: c,
                    op,
                    value,
                } if c.column == column => Some((*op, value)),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateNode::And(children) if children.is_empty() => f.write_str("TRUE"),
            PredicateNode::Or(children) if children.is_empty() => f.write_str("FALSE"),
            PredicateNode::And(children) => write_joined(f, children, " AND "),
            PredicateNode::Or(children) => write_joined(f, children, " OR "),
            PredicateNode::Not(inner) => write!(f, "NOT ({})", inner),
            PredicateNode::Compare { column, op, value } => {
                write!(f, "{} {} {}", column, op, value)
            }
            PredicateNode::IsNull(column) => write!(f, "{} IS NULL", column),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[PredicateNode], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}
