//! Materialized entity instances
//!
//! A `Row` is what a compiled materializer produces from one record: the
//! entity name plus every projected property in projection order, each
//! already converted to its declared kind. Typed callers implement
//! `FromRow` (usually through `Entity`) to lift rows into their own structs.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::codec::{ConversionError, ConversionResult, ScalarKind, ScalarValue};
use crate::mapping::EntityMapping;
use crate::query::QueryExpression;

/// One fully materialized entity instance
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    entity: String,
    fields: Vec<(String, ScalarValue)>,
}

impl Row {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_capacity(entity: impl Into<String>, capacity: usize) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, property: impl Into<String>, value: ScalarValue) {
        self.fields.push((property.into(), value));
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn fields(&self) -> &[(String, ScalarValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, property: &str) -> Option<&ScalarValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Extracts a property as a Rust type.
    ///
    /// Fails if the property is not part of the row or holds another kind.
    pub fn get_as<T: FromScalar>(&self, property: &str) -> ConversionResult<T> {
        let value = self
            .get(property)
            .ok_or_else(|| ConversionError::missing(T::KIND).with_property(property, property))?;

        T::from_scalar(value).ok_or_else(|| {
            let observed = value.kind().map(|k| k.as_str()).unwrap_or("null");
            ConversionError::wrong_shape(T::KIND, observed).with_property(property, property)
        })
    }

    /// JSON object keyed by property name
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}

/// Rust types a materialized scalar can be extracted as
pub trait FromScalar: Sized {
    /// Kind reported in conversion errors
    const KIND: ScalarKind;

    /// Returns None when the value holds a different kind
    fn from_scalar(value: &ScalarValue) -> Option<Self>;
}

macro_rules! impl_from_scalar {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FromScalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn from_scalar(value: &ScalarValue) -> Option<Self> {
                match value {
                    ScalarValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_scalar!(String, String, String);
impl_from_scalar!(bool, Bool, Bool);
impl_from_scalar!(u8, Byte, Byte);
impl_from_scalar!(i16, Short, Short);
impl_from_scalar!(i32, Int, Int);
impl_from_scalar!(i64, Long, Long);
impl_from_scalar!(f32, Float, Float);
impl_from_scalar!(f64, Double, Double);
impl_from_scalar!(Decimal, Decimal, Decimal);
impl_from_scalar!(Uuid, Uuid, Uuid);
impl_from_scalar!(DateTime<Utc>, DateTime, DateTime);
impl_from_scalar!(DateTime<FixedOffset>, DateTimeOffset, DateTimeOffset);

impl<T: FromScalar> FromScalar for Option<T> {
    const KIND: ScalarKind = T::KIND;

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Null => Some(None),
            other => T::from_scalar(other).map(Some),
        }
    }
}

/// Types that can be built from a materialized row
pub trait FromRow: Sized {
    fn from_row(row: Row) -> ConversionResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> ConversionResult<Self> {
        Ok(row)
    }
}

/// A typed entity shape with its own mapping declaration
pub trait Entity: FromRow {
    /// Entity shape name used in query expressions
    const NAME: &'static str;

    /// Table and property mapping for this shape
    fn mapping() -> EntityMapping;

    /// Full scan over this shape
    fn query() -> QueryExpression {
        QueryExpression::scan(Self::NAME)
    }
}
