//! Query translator
//!
//! Converts a front-end expression into a `QueryModel`.
//!
//! Translation runs in two passes (strict order):
//! 1. Shape check: walk the whole tree and reject the first unsupported
//!    construct, before any metadata lookup
//! 2. Resolution: resolve the entity mapping and build the full projection
//!
//! Only a plain scan, optionally wrapped in option annotations or an
//! identity projection, is accepted. Nothing is ever partially translated.

use std::collections::HashSet;

use crate::mapping::MappingCache;

use super::errors::{TranslationError, TranslationResult};
use super::expr::{QueryExpression, QueryOptions};
use super::model::QueryModel;

/// Output of translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    /// Model to compile
    pub model: QueryModel,
    /// Per-query options (not part of the compiled shape)
    pub options: QueryOptions,
}

/// Translator bound to a mapping cache
pub struct QueryTranslator<'a> {
    mappings: &'a MappingCache,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(mappings: &'a MappingCache) -> Self {
        Self { mappings }
    }

    /// Translates an expression, or fails naming the unsupported construct.
    pub fn translate(&self, expr: &QueryExpression) -> TranslationResult<TranslatedQuery> {
        // Pass 1: shape check, no metadata access
        check_shape(expr)?;

        // Pass 2: resolve
        self.resolve(expr)
    }

    fn resolve(&self, expr: &QueryExpression) -> TranslationResult<TranslatedQuery> {
        match expr {
            QueryExpression::Scan { entity } => {
                if entity.trim().is_empty() {
                    return Err(TranslationError::invalid("scan requires an entity name"));
                }
                let mapping = self.mappings.mapping_for(entity)?;
                Ok(TranslatedQuery {
                    model: QueryModel::from_mapping(&mapping)?,
                    options: QueryOptions::default(),
                })
            }
            QueryExpression::Configure { source, options } => {
                validate_options(options)?;
                let inner = self.resolve(source)?;
                Ok(TranslatedQuery {
                    model: inner.model,
                    options: inner.options.merged_with(*options),
                })
            }
            QueryExpression::Project { source, properties } => {
                let inner = self.resolve(source)?;
                check_identity_projection(&inner.model, properties)?;
                Ok(inner)
            }
            // Pass 1 already rejected every other construct
            other => Err(unsupported(other)),
        }
    }
}

/// Rejects the outermost unsupported construct in the tree
fn check_shape(expr: &QueryExpression) -> TranslationResult<()> {
    match expr {
        QueryExpression::Scan { .. } => Ok(()),
        QueryExpression::Configure { source, .. } | QueryExpression::Project { source, .. } => {
            check_shape(source)
        }
        QueryExpression::Filter { .. }
        | QueryExpression::OrderBy { .. }
        | QueryExpression::Join { .. }
        | QueryExpression::GroupBy { .. }
        | QueryExpression::Aggregate { .. }
        | QueryExpression::Take { .. }
        | QueryExpression::Skip { .. }
        | QueryExpression::Distinct { .. } => Err(unsupported(expr)),
    }
}

fn unsupported(expr: &QueryExpression) -> TranslationError {
    let detail = match expr {
        QueryExpression::Filter { predicate, .. } => {
            format!("filtering by '{}' is not supported; only full scans are", predicate)
        }
        QueryExpression::OrderBy {
            property,
            descending,
            ..
        } => format!(
            "ordering by '{}' {} is not supported",
            property,
            if *descending { "descending" } else { "ascending" }
        ),
        QueryExpression::Join { on, .. } => format!("join on '{}' is not supported", on),
        QueryExpression::GroupBy { key, .. } => format!("grouping by '{}' is not supported", key),
        QueryExpression::Aggregate { function, .. } => {
            format!("aggregate '{}' is not supported", function)
        }
        QueryExpression::Take { count, .. } => format!("limit of {} is not supported", count),
        QueryExpression::Skip { count, .. } => format!("offset of {} is not supported", count),
        QueryExpression::Distinct { .. } => "distinct is not supported".to_string(),
        other => format!("'{}' cannot be translated", other),
    };
    TranslationError::unsupported(expr.construct_name(), detail)
}

fn validate_options(options: &QueryOptions) -> TranslationResult<()> {
    if options.page_size == Some(0) {
        return Err(TranslationError::invalid("page size must be greater than zero"));
    }
    Ok(())
}

/// A projection is accepted only if it lists exactly the mapped properties
fn check_identity_projection(model: &QueryModel, properties: &[String]) -> TranslationResult<()> {
    let mut requested = HashSet::new();
    for name in properties {
        if model.property(name).is_none() {
            return Err(TranslationError::invalid(format!(
                "projection names unknown property '{}' of entity '{}'",
                name,
                model.entity()
            )));
        }
        if !requested.insert(name.as_str()) {
            return Err(TranslationError::invalid(format!(
                "projection names property '{}' more than once",
                name
            )));
        }
    }

    if requested.len() != model.properties().len() {
        let missing: Vec<&str> = model
            .properties()
            .iter()
            .map(|p| p.property.as_str())
            .filter(|p| !requested.contains(p))
            .collect();
        return Err(TranslationError::unsupported(
            "projection",
            format!(
                "narrowing to {} of {} properties is not supported (omits {})",
                requested.len(),
                model.properties().len(),
                missing.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarKind;
    use crate::mapping::{EntityMapping, PropertyMapping, StaticMappings};
    use crate::query::TranslationErrorCode;
    use std::sync::Arc;

    fn cache() -> MappingCache {
        let mappings = StaticMappings::from_mappings([EntityMapping::new("User", "users")
            .with_property(PropertyMapping::new("Id", ScalarKind::String).stored_as("pk"))
            .with_property(PropertyMapping::new("Name", ScalarKind::String))
            .with_property(PropertyMapping::new("Age", ScalarKind::Int))])
        .unwrap();
        MappingCache::new(Arc::new(mappings))
    }

    #[test]
    fn test_plain_scan_translates() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let translated = translator.translate(&QueryExpression::scan("User")).unwrap();
        assert_eq!(translated.model.table(), "users");
        assert_eq!(translated.model.attribute_names(), vec!["pk", "Name", "Age"]);
        assert_eq!(translated.options, QueryOptions::default());
    }

    #[test]
    fn test_options_are_collected() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let expr = QueryExpression::scan("User")
            .with_page_size(10)
            .without_pagination()
            .with_page_size(20);
        let translated = translator.translate(&expr).unwrap();
        assert_eq!(translated.options.page_size, Some(20));
        assert_eq!(translated.options.auto_paginate, Some(false));
    }

    #[test]
    fn test_zero_page_size_invalid() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let err = translator
            .translate(&QueryExpression::scan("User").with_page_size(0))
            .unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::AeroQueryInvalid);
    }

    #[test]
    fn test_each_unsupported_construct_named() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);
        let base = || QueryExpression::scan("User");

        let cases = [
            (base().filter("Age > 3"), "filter"),
            (base().order_by("Name"), "ordering"),
            (base().join(QueryExpression::scan("Order"), "Id"), "join"),
            (base().group_by("Age"), "grouping"),
            (base().aggregate("count"), "aggregation"),
            (base().take(5), "limit"),
            (base().skip(5), "offset"),
            (base().distinct(), "distinct"),
        ];

        for (expr, construct) in cases {
            let err = translator.translate(&expr).unwrap_err();
            assert!(err.is_unsupported(), "{} should be unsupported", construct);
            assert_eq!(err.construct(), Some(construct));
        }
    }

    #[test]
    fn test_unsupported_detected_before_mapping_lookup() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let err = translator
            .translate(&QueryExpression::scan("Ghost").filter("x = 1"))
            .unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(cache.provider_lookups(), 0);
    }

    #[test]
    fn test_nested_unsupported_under_configure() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let expr = QueryExpression::scan("User").order_by_descending("Age").with_page_size(3);
        let err = translator.translate(&expr).unwrap_err();
        assert_eq!(err.construct(), Some("ordering"));
        assert!(err.message().contains("descending"));
    }

    #[test]
    fn test_identity_projection_accepted() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let expr = QueryExpression::scan("User").select(["Age", "Id", "Name"]);
        let translated = translator.translate(&expr).unwrap();
        // Declaration order is kept regardless of projection order
        assert_eq!(translated.model.attribute_names(), vec!["pk", "Name", "Age"]);
    }

    #[test]
    fn test_narrowing_projection_rejected() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let err = translator
            .translate(&QueryExpression::scan("User").select(["Id", "Name"]))
            .unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.construct(), Some("projection"));
        assert!(err.message().contains("Age"));
    }

    #[test]
    fn test_unknown_projection_property_invalid() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let err = translator
            .translate(&QueryExpression::scan("User").select(["Id", "Name", "Email"]))
            .unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::AeroQueryInvalid);
    }

    #[test]
    fn test_unknown_entity() {
        let cache = cache();
        let translator = QueryTranslator::new(&cache);

        let err = translator.translate(&QueryExpression::scan("Ghost")).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::AeroQueryMappingFailed);
    }
}
