//! Entity mapping declarations
//!
//! A mapping ties an entity shape to a store table and each scalar property
//! to a store attribute and a declared kind. The attribute name defaults to
//! the property name.
//!
//! ```json
//! {
//!   "entity": "User",
//!   "table": "users",
//!   "properties": [
//!     { "name": "Id", "attribute": "pk", "kind": "uuid" },
//!     { "name": "Age", "kind": "int", "nullable": true }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::codec::ScalarKind;

use super::errors::{MappingError, MappingResult};

/// One mapped scalar property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    /// Property name on the entity shape
    pub name: String,
    /// Store attribute name (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Declared scalar kind
    pub kind: ScalarKind,
    /// Whether an absent/null attribute reads as null
    #[serde(default)]
    pub nullable: bool,
}

impl PropertyMapping {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            attribute: None,
            kind,
            nullable: false,
        }
    }

    /// Maps the property to a differently named store attribute
    pub fn stored_as(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Effective store attribute name
    pub fn attribute_name(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }
}

/// Mapping of one entity shape onto one store table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    /// Entity shape name
    pub entity: String,
    /// Store table name
    pub table: String,
    /// Scalar properties in declaration order
    pub properties: Vec<PropertyMapping>,
}

impl EntityMapping {
    pub fn new(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            table: table.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a property
    pub fn with_property(mut self, property: PropertyMapping) -> Self {
        self.properties.push(property);
        self
    }

    /// Looks up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyMapping> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Validates the mapping structure.
    ///
    /// A valid mapping names its entity and table, declares at least one
    /// property, and uses every property and attribute name once.
    pub fn validate_structure(&self) -> MappingResult<()> {
        if self.entity.trim().is_empty() {
            return Err(MappingError::invalid("<unnamed>", "entity name must not be empty"));
        }
        if self.table.trim().is_empty() {
            return Err(MappingError::invalid(&self.entity, "table name must not be empty"));
        }
        if self.properties.is_empty() {
            return Err(MappingError::invalid(
                &self.entity,
                "mapping must declare at least one property",
            ));
        }

        let mut names = HashSet::new();
        let mut attributes = HashSet::new();
        for property in &self.properties {
            if property.name.trim().is_empty() || property.attribute_name().trim().is_empty() {
                return Err(MappingError::invalid(
                    &self.entity,
                    "property and attribute names must not be empty",
                ));
            }
            if !names.insert(property.name.as_str()) {
                return Err(MappingError::invalid(
                    &self.entity,
                    format!("duplicate property '{}'", property.name),
                ));
            }
            if !attributes.insert(property.attribute_name()) {
                return Err(MappingError::invalid(
                    &self.entity,
                    format!("duplicate attribute '{}'", property.attribute_name()),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_mapping() -> EntityMapping {
        EntityMapping::new("User", "users")
            .with_property(PropertyMapping::new("Id", ScalarKind::Uuid).stored_as("pk"))
            .with_property(PropertyMapping::new("Name", ScalarKind::String))
            .with_property(PropertyMapping::new("Age", ScalarKind::Int).nullable())
    }

    #[test]
    fn test_valid_mapping() {
        assert!(user_mapping().validate_structure().is_ok());
    }

    #[test]
    fn test_attribute_defaults_to_property_name() {
        let mapping = user_mapping();
        assert_eq!(mapping.property("Id").unwrap().attribute_name(), "pk");
        assert_eq!(mapping.property("Name").unwrap().attribute_name(), "Name");
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mapping = user_mapping()
            .with_property(PropertyMapping::new("Key", ScalarKind::String).stored_as("pk"));
        let err = mapping.validate_structure().unwrap_err();
        assert!(err.message().contains("duplicate attribute 'pk'"));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let mapping =
            user_mapping().with_property(PropertyMapping::new("Name", ScalarKind::String).stored_as("n2"));
        let err = mapping.validate_structure().unwrap_err();
        assert!(err.message().contains("duplicate property 'Name'"));
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let mapping = EntityMapping::new("Empty", "empty");
        assert!(mapping.validate_structure().is_err());
    }

    #[test]
    fn test_mapping_from_json() {
        let mapping: EntityMapping = serde_json::from_value(json!({
            "entity": "User",
            "table": "users",
            "properties": [
                { "name": "Id", "attribute": "pk", "kind": "uuid" },
                { "name": "Joined", "kind": "date_time" },
                { "name": "Age", "kind": "int", "nullable": true }
            ]
        }))
        .unwrap();

        assert_eq!(mapping.properties.len(), 3);
        assert_eq!(mapping.properties[1].kind, ScalarKind::DateTime);
        assert!(mapping.properties[2].nullable);
        assert!(!mapping.properties[0].nullable);
    }
}
