//! Raw store records
//!
//! A record is one item returned by the store: attribute name to value.
//! Records are produced per page and consumed once by a materializer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::AttributeValue;

/// One raw item from the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attributes: BTreeMap<String, AttributeValue>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insertion
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Inserts or replaces an attribute
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }

    /// Looks up an attribute by its store name
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attribute names in deterministic order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Keeps only the named attributes
    pub fn project(&self, names: &[String]) -> Record {
        let attributes = names
            .iter()
            .filter_map(|n| self.attributes.get(n).map(|v| (n.clone(), v.clone())))
            .collect();
        Record { attributes }
    }
}

impl FromIterator<(String, AttributeValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Record {
            attributes: iter.into_iter().collect(),
        }
    }
}
