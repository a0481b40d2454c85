//! Attribute value wire type
//!
//! A closed tagged union mirroring the store's attribute encoding:
//!
//! ```text
//! {"S": "text"}   {"N": "12.5"}   {"BOOL": true}   {"NULL": true}
//! {"B": "<base64>"}   {"L": [...]}   {"M": {"k": {...}}}
//! ```
//!
//! Numbers are kept as decimal text so that every reader can parse them on
//! its own terms without precision loss.

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// One stored field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// UTF-8 string
    String(String),
    /// Decimal text, stored verbatim
    Number(String),
    /// Dedicated boolean variant (never encoded as 0/1)
    Bool(bool),
    /// Explicit null
    Null,
    /// Raw bytes
    Binary(Vec<u8>),
    /// Ordered list of nested values
    List(Vec<AttributeValue>),
    /// Nested map of values
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Wire tag for this variant
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "S",
            AttributeValue::Number(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null => "NULL",
            AttributeValue::Binary(_) => "B",
            AttributeValue::List(_) => "L",
            AttributeValue::Map(_) => "M",
        }
    }

    /// Human-readable shape name for error messages
    pub fn shape_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Number(_) => "number",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Null => "null",
            AttributeValue::Binary(_) => "binary",
            AttributeValue::List(_) => "list",
            AttributeValue::Map(_) => "map",
        }
    }

    /// Creates a number from anything that renders as decimal text
    pub fn number(value: impl ToString) -> Self {
        AttributeValue::Number(value.to_string())
    }

    /// Returns the string payload, if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the decimal text, if this is a number
    pub fn as_number_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{{S: {:?}}}", s),
            AttributeValue::Number(n) => write!(f, "{{N: {}}}", n),
            AttributeValue::Bool(b) => write!(f, "{{BOOL: {}}}", b),
            AttributeValue::Null => write!(f, "{{NULL}}"),
            AttributeValue::Binary(bytes) => write!(f, "{{B: {} bytes}}", bytes.len()),
            AttributeValue::List(items) => write!(f, "{{L: {} items}}", items.len()),
            AttributeValue::Map(entries) => write!(f, "{{M: {} entries}}", entries.len()),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            AttributeValue::String(s) => map.serialize_entry("S", s)?,
            AttributeValue::Number(n) => map.serialize_entry("N", n)?,
            AttributeValue::Bool(b) => map.serialize_entry("BOOL", b)?,
            AttributeValue::Null => map.serialize_entry("NULL", &true)?,
            AttributeValue::Binary(bytes) => map.serialize_entry("B", &BASE64.encode(bytes))?,
            AttributeValue::List(items) => map.serialize_entry("L", items)?,
            AttributeValue::Map(entries) => map.serialize_entry("M", entries)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an attribute value object with exactly one type tag")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut value: Option<AttributeValue> = None;

        while let Some(tag) = access.next_key::<String>()? {
            if let Some(existing) = &value {
                return Err(de::Error::custom(format!(
                    "attribute value carries more than one type tag ('{}' and '{}')",
                    existing.tag(),
                    tag
                )));
            }

            let decoded = match tag.as_str() {
                "S" => AttributeValue::String(access.next_value()?),
                "N" => {
                    let text: String = access.next_value()?;
                    if text.trim().is_empty() {
                        return Err(de::Error::custom("number attribute has empty text"));
                    }
                    AttributeValue::Number(text)
                }
                "BOOL" => AttributeValue::Bool(access.next_value()?),
                "NULL" => {
                    let _: bool = access.next_value()?;
                    AttributeValue::Null
                }
                "B" => {
                    let encoded: String = access.next_value()?;
                    let bytes = BASE64
                        .decode(encoded.as_bytes())
                        .map_err(|e| de::Error::custom(format!("invalid base64 binary: {}", e)))?;
                    AttributeValue::Binary(bytes)
                }
                "L" => AttributeValue::List(access.next_value()?),
                "M" => AttributeValue::Map(access.next_value()?),
                other => {
                    return Err(de::Error::custom(format!(
                        "unknown attribute type tag '{}'",
                        other
                    )))
                }
            };
            value = Some(decoded);
        }

        value.ok_or_else(|| de::Error::custom("attribute value has no type tag"))
    }
}
