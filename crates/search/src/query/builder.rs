//! Predicate tree assembly.
//!
//! [`SearchBuilder::compile`] turns a [`SearchQuery`] into a [`CompiledQuery`]:
//! one join per (parameter name, parameter type), values of one parameter
//! ORed, distinct parameters ANDed, each guarded by its identity and partition
//! predicates.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};
use crate::predicate::{IndexJoin, IndexTable, JoinKey, PredicateNode, QueryRoot};
use crate::query::identity::IdentityPredicateBuilder;
use crate::query::parameter_handlers::build_value_predicate;
use crate::types::{SearchModifier, SearchParamType, SearchParameter, SearchQuery};

/// The output of a compilation pass, handed to the storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledQuery {
    /// The resource type searched.
    pub resource_type: String,
    /// Index joins the predicate references, in creation order.
    pub joins: Vec<IndexJoin>,
    /// Conjunction of all criteria. Trivially true when there are none.
    pub predicate: PredicateNode,
    /// Whether any index table is joined (the engine may need DISTINCT).
    pub has_index_joins: bool,
}

impl CompiledQuery {
    /// Returns the shared join for a parameter, if one was created.
    pub fn join_for(&self, param_name: &str, param_type: SearchParamType) -> Option<&IndexJoin> {
        self.joins.iter().find(|j| {
            j.key
                .as_ref()
                .is_some_and(|k| k.param_name == param_name && k.param_type == param_type)
        })
    }
}

/// Compiles search criteria into predicate trees.
///
/// The builder holds only configuration. Every call to
/// [`compile`](Self::compile) gets a fresh [`QueryRoot`], so join handles are
/// never shared between queries.
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    config: SearchConfig,
}

impl SearchBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Compiles a query.
    pub fn compile(&self, query: &SearchQuery) -> SearchResult<CompiledQuery> {
        let mut root = QueryRoot::new();
        let identity =
            IdentityPredicateBuilder::new(&self.config, &query.resource_type, query.partition);

        for param in &query.parameters {
            self.add_parameter(&mut root, &identity, param)?;
        }

        let (joins, predicate, has_index_joins) = root.into_parts();
        tracing::debug!(
            resource_type = %query.resource_type,
            joins = joins.len(),
            has_index_joins,
            "Compiled search predicate"
        );

        Ok(CompiledQuery {
            resource_type: query.resource_type.clone(),
            joins,
            predicate,
            has_index_joins,
        })
    }

    fn add_parameter(
        &self,
        root: &mut QueryRoot,
        identity: &IdentityPredicateBuilder<'_>,
        param: &SearchParameter,
    ) -> SearchResult<()> {
        if let Some(modifier) = &param.modifier {
            if !modifier.is_valid_for(param.param_type) {
                return Err(SearchError::invalid(format!(
                    "modifier ':{}' is not valid for {} parameter '{}'",
                    modifier, param.param_type, param.name
                )));
            }
        }

        if param.values.is_empty() {
            return Ok(());
        }

        if param.is_missing_search() {
            return Self::add_missing(root, identity, param);
        }

        for value in &param.values {
            if !value.prefix.is_valid_for(param.param_type) {
                return Err(SearchError::UnsupportedPrefix {
                    prefix: value.prefix,
                    param_type: param.param_type,
                    value: value.to_query_token(),
                });
            }
        }

        let join = root.get_or_create_join(JoinKey::new(&param.name, param.param_type));
        let modifier = param.modifier.as_ref();
        let values = param
            .values
            .iter()
            .map(|value| build_value_predicate(param.param_type, join, value, modifier))
            .collect::<SearchResult<Vec<_>>>()?;

        // A negated parameter must exclude every listed value
        let value_predicate = if matches!(modifier, Some(SearchModifier::Not)) {
            PredicateNode::all(values)
        } else {
            PredicateNode::any(values)
        };

        root.set_has_index_joins();
        root.add_predicate(identity.combine_with_identity(join, &param.name, value_predicate));
        Ok(())
    }

    fn add_missing(
        root: &mut QueryRoot,
        identity: &IdentityPredicateBuilder<'_>,
        param: &SearchParameter,
    ) -> SearchResult<()> {
        let [value] = param.values.as_slice() else {
            return Err(SearchError::invalid(format!(
                "':missing' on '{}' takes exactly one value",
                param.name
            )));
        };
        let missing = match value.value.trim() {
            "true" => true,
            "false" => false,
            other => {
                return Err(SearchError::invalid(format!(
                    "':missing' on '{}' must be true or false, got '{}'",
                    param.name, other
                )));
            }
        };

        if IndexTable::for_param_type(param.param_type).has_missing_column() {
            let join = root.get_or_create_join(JoinKey::new(&param.name, param.param_type));
            identity.add_missing_for_non_reference(root, join, &param.name, missing);
        } else {
            identity.add_missing_for_reference(root, &param.name, missing);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchPrefix, SearchValue};

    fn literal_builder() -> SearchBuilder {
        SearchBuilder::new(SearchConfig {
            disable_hash_based_searches: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_query_has_no_joins() {
        let compiled = SearchBuilder::default()
            .compile(&SearchQuery::new("Patient"))
            .unwrap();
        assert!(compiled.joins.is_empty());
        assert!(!compiled.has_index_joins);
        assert!(compiled.predicate.is_trivially_true());
    }

    #[test]
    fn test_values_ored_parameters_anded() {
        let query = SearchQuery::new("Observation")
            .with_parameter(
                SearchParameter::new("code", SearchParamType::Token).with_tokens(["a", "b"]),
            )
            .with_parameter(
                SearchParameter::new("value", SearchParamType::Number).with_tokens(["gt5"]),
            );
        let compiled = literal_builder().compile(&query).unwrap();
        assert_eq!(compiled.joins.len(), 2);
        assert_eq!(
            compiled.predicate.to_string(),
            "(j0.res_type = 'Observation' AND j0.sp_name = 'code' \
             AND (j0.token_value = 'a' OR j0.token_value = 'b') \
             AND j1.res_type = 'Observation' AND j1.sp_name = 'value' AND j1.value_number > 5)"
        );
    }

    #[test]
    fn test_invalid_modifier_rejected() {
        let query = SearchQuery::new("Patient").with_parameter(
            SearchParameter::new("birthdate", SearchParamType::Date)
                .with_modifier(SearchModifier::Exact)
                .with_tokens(["2011"]),
        );
        assert!(SearchBuilder::default().compile(&query).unwrap_err().is_invalid_request());
    }

    #[test]
    fn test_not_excludes_every_value() {
        let query = SearchQuery::new("Observation").with_parameter(
            SearchParameter::new("status", SearchParamType::Token)
                .with_modifier(SearchModifier::Not)
                .with_tokens(["final", "amended"]),
        );
        let compiled = literal_builder().compile(&query).unwrap();
        assert_eq!(
            compiled.predicate.to_string(),
            "(j0.res_type = 'Observation' AND j0.sp_name = 'status' \
             AND NOT (j0.token_value = 'final') AND NOT (j0.token_value = 'amended'))"
        );
    }

    #[test]
    fn test_missing_requires_boolean() {
        let query = SearchQuery::new("Patient").with_parameter(
            SearchParameter::new("name", SearchParamType::String)
                .with_modifier(SearchModifier::Missing)
                .with_tokens(["maybe"]),
        );
        assert!(SearchBuilder::default().compile(&query).is_err());
    }

    #[test]
    fn test_missing_routes_by_index_table() {
        let missing = |name: &str, param_type| {
            SearchParameter::new(name, param_type)
                .with_modifier(SearchModifier::Missing)
                .with_tokens(["true"])
        };
        let query = SearchQuery::new("Observation")
            .with_parameter(missing("code", SearchParamType::Token))
            .with_parameter(missing("subject", SearchParamType::Reference));
        let compiled = literal_builder().compile(&query).unwrap();

        let tables: Vec<_> = compiled.joins.iter().map(|j| j.table).collect();
        assert_eq!(tables, [IndexTable::Token, IndexTable::SearchParamPresent]);
        assert!(compiled.join_for("code", SearchParamType::Token).is_some());
        assert!(compiled.join_for("subject", SearchParamType::Reference).is_none());
    }

    #[test]
    fn test_prefix_not_valid_for_type() {
        let query = SearchQuery::new("Patient").with_parameter(
            SearchParameter::new("name", SearchParamType::String)
                .with_value(SearchValue::new(SearchPrefix::Gt, "a")),
        );
        let err = SearchBuilder::default().compile(&query).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedPrefix { .. }));
    }
}
