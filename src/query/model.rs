//! Query model
//!
//! Intermediate representation of one flat entity fetch: a table and the
//! ordered list of projected scalar properties. Independent of the front-end
//! expression syntax, immutable once built.

use std::collections::HashSet;
use std::fmt;

use crate::codec::ScalarKind;
use crate::mapping::EntityMapping;

use super::errors::{TranslationError, TranslationResult};

/// One projected property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectedProperty {
    /// Property name on the entity shape
    pub property: String,
    /// Store attribute the property is read from
    pub attribute: String,
    /// Declared scalar kind
    pub kind: ScalarKind,
    /// Absent/null attribute reads as null
    pub nullable: bool,
}

/// Content-derived cache key for a query model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey(String);

impl ModelKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flat "select these properties from this table" model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryModel {
    entity: String,
    table: String,
    properties: Vec<ProjectedProperty>,
}

impl QueryModel {
    /// Builds a model.
    ///
    /// Rejects an empty projection and duplicate store attribute names.
    pub fn new(
        entity: impl Into<String>,
        table: impl Into<String>,
        properties: Vec<ProjectedProperty>,
    ) -> TranslationResult<Self> {
        let entity = entity.into();
        let table = table.into();

        if table.is_empty() {
            return Err(TranslationError::invalid("query model requires a table name"));
        }
        if properties.is_empty() {
            return Err(TranslationError::invalid(format!(
                "query model for table '{}' projects no properties",
                table
            )));
        }

        let mut seen = HashSet::new();
        for property in &properties {
            if !seen.insert(property.attribute.as_str()) {
                return Err(TranslationError::invalid(format!(
                    "attribute '{}' is projected more than once from table '{}'",
                    property.attribute, table
                )));
            }
        }

        Ok(Self {
            entity,
            table,
            properties,
        })
    }

    /// Full projection of every mapped property, in declaration order
    pub fn from_mapping(mapping: &EntityMapping) -> TranslationResult<Self> {
        let properties = mapping
            .properties
            .iter()
            .map(|p| ProjectedProperty {
                property: p.name.clone(),
                attribute: p.attribute_name().to_string(),
                kind: p.kind,
                nullable: p.nullable,
            })
            .collect();
        Self::new(&mapping.entity, &mapping.table, properties)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn properties(&self) -> &[ProjectedProperty] {
        &self.properties
    }

    /// Looks up a projected property by property name
    pub fn property(&self, name: &str) -> Option<&ProjectedProperty> {
        self.properties.iter().find(|p| p.property == name)
    }

    /// Store attribute names in projection order
    pub fn attribute_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.attribute.clone()).collect()
    }

    /// Cache key built from the model content.
    ///
    /// Two models built independently from the same mapping yield equal keys.
    pub fn key(&self) -> ModelKey {
        let mut key = String::with_capacity(64);
        key.push_str(&self.entity);
        key.push('@');
        key.push_str(&self.table);
        for p in &self.properties {
            key.push('|');
            key.push_str(&p.property);
            key.push('=');
            key.push_str(&p.attribute);
            key.push(':');
            key.push_str(p.kind.as_str());
            if p.nullable {
                key.push('?');
            }
        }
        ModelKey(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::PropertyMapping;

    fn prop(property: &str, attribute: &str, kind: ScalarKind) -> ProjectedProperty {
        ProjectedProperty {
            property: property.into(),
            attribute: attribute.into(),
            kind,
            nullable: false,
        }
    }

    #[test]
    fn test_empty_projection_rejected() {
        let err = QueryModel::new("User", "users", vec![]).unwrap_err();
        assert!(err.message().contains("projects no properties"));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let result = QueryModel::new(
            "User",
            "users",
            vec![
                prop("A", "x", ScalarKind::Int),
                prop("B", "x", ScalarKind::Int),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_key_is_content_derived() {
        let mapping = EntityMapping::new("User", "users")
            .with_property(PropertyMapping::new("Id", ScalarKind::Uuid).stored_as("pk"))
            .with_property(PropertyMapping::new("Age", ScalarKind::Int).nullable());

        let a = QueryModel::from_mapping(&mapping).unwrap();
        let b = QueryModel::from_mapping(&mapping.clone()).unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().as_str(), "User@users|Id=pk:uuid|Age=Age:int?");
    }

    #[test]
    fn test_key_distinguishes_kinds() {
        let a = QueryModel::new("E", "t", vec![prop("A", "a", ScalarKind::Int)]).unwrap();
        let b = QueryModel::new("E", "t", vec![prop("A", "a", ScalarKind::Long)]).unwrap();
        assert_ne!(a.key(), b.key());
    }
}
