//! Scalar kinds and typed scalar values
//!
//! Supported kinds:
//! - string, bool
//! - byte (u8), short (i16), int (i32), long (i64)
//! - float (f32), double (f64), decimal
//! - uuid
//! - date_time (UTC instant), date_time_offset (instant with fixed offset)

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared kind of a mapped scalar property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Uuid,
    DateTime,
    DateTimeOffset,
}

impl ScalarKind {
    /// Returns the kind name used in config files and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Uuid => "uuid",
            ScalarKind::DateTime => "date_time",
            ScalarKind::DateTimeOffset => "date_time_offset",
        }
    }

    /// Attribute payload this kind is written as
    pub fn wire_shape(&self) -> &'static str {
        match self {
            ScalarKind::String | ScalarKind::Uuid => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Byte
            | ScalarKind::Short
            | ScalarKind::Int
            | ScalarKind::Long
            | ScalarKind::Float
            | ScalarKind::Double
            | ScalarKind::Decimal => "number",
            ScalarKind::DateTime | ScalarKind::DateTimeOffset => "string or number",
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(
            self,
            ScalarKind::Float | ScalarKind::Double | ScalarKind::Decimal
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ScalarKind::DateTime | ScalarKind::DateTimeOffset)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed scalar read from, or about to be written to, the store
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Only produced for nullable properties
    Null,
    String(String),
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl ScalarValue {
    /// Kind of this value, or None for null
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::String(_) => Some(ScalarKind::String),
            ScalarValue::Bool(_) => Some(ScalarKind::Bool),
            ScalarValue::Byte(_) => Some(ScalarKind::Byte),
            ScalarValue::Short(_) => Some(ScalarKind::Short),
            ScalarValue::Int(_) => Some(ScalarKind::Int),
            ScalarValue::Long(_) => Some(ScalarKind::Long),
            ScalarValue::Float(_) => Some(ScalarKind::Float),
            ScalarValue::Double(_) => Some(ScalarKind::Double),
            ScalarValue::Decimal(_) => Some(ScalarKind::Decimal),
            ScalarValue::Uuid(_) => Some(ScalarKind::Uuid),
            ScalarValue::DateTime(_) => Some(ScalarKind::DateTime),
            ScalarValue::DateTimeOffset(_) => Some(ScalarKind::DateTimeOffset),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// JSON rendering used by the CLI and explain output
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            ScalarValue::Null => Value::Null,
            ScalarValue::String(s) => Value::String(s.clone()),
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Byte(v) => Value::from(*v),
            ScalarValue::Short(v) => Value::from(*v),
            ScalarValue::Int(v) => Value::from(*v),
            ScalarValue::Long(v) => Value::from(*v),
            ScalarValue::Float(v) => Value::from(*v),
            ScalarValue::Double(v) => Value::from(*v),
            ScalarValue::Decimal(d) => Value::String(d.to_string()),
            ScalarValue::Uuid(u) => Value::String(u.to_string()),
            ScalarValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            ScalarValue::DateTimeOffset(dt) => Value::String(dt.to_rfc3339()),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Long(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Double(v)
    }
}

impl From<Uuid> for ScalarValue {
    fn from(u: Uuid) -> Self {
        ScalarValue::Uuid(u)
    }
}

impl From<DateTime<Utc>> for ScalarValue {
    fn from(dt: DateTime<Utc>) -> Self {
        ScalarValue::DateTime(dt)
    }
}
