//! Backend-agnostic predicate trees over index joins.
//!
//! The query compiler never emits SQL text. It produces a [`PredicateNode`]
//! tree whose leaves reference index columns through [`JoinHandle`]s owned by
//! a [`QueryRoot`]. Storage backends translate the tree.
//!
//! # Examples
//!
//! ```
//! use helios_search::predicate::{IndexColumn, JoinKey, PredicateNode, QueryRoot};
//! use helios_search::types::SearchParamType;
//!
//! let mut root = QueryRoot::new();
//! let join = root.get_or_create_join(JoinKey::new("code", SearchParamType::Token));
//!
//! let predicate = PredicateNode::eq(join.column(IndexColumn::TokenValue), "8480-6");
//! assert_eq!(predicate.to_string(), "j0.token_value = '8480-6'");
//! ```

mod join;
mod node;

pub use join::{IndexColumn, IndexJoin, IndexTable, JoinHandle, JoinKey, QueryRoot};
pub use node::{ColumnRef, CompareOp, PredicateNode, PredicateValue};
