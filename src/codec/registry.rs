//! Type conversion registry
//!
//! Bidirectional codec between typed scalars and attribute values.
//! Readers are plain function pointers so compiled materializers can hold
//! them without allocation or locking.
//!
//! Read rules:
//! - string: absent or null payload reads as ""
//! - bool: absent or null payload reads as false
//! - numbers: invariant decimal text; malformed text is an error
//! - uuid: hyphenated text only
//! - date/time: ISO-8601 string first, then epoch-seconds number,
//!   then the epoch default when neither payload is present

use std::num::IntErrorKind;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::attribute::AttributeValue;

use super::errors::{ConversionError, ConversionResult};
use super::kind::{ScalarKind, ScalarValue};

/// Reader for one scalar kind
pub type ReadFn = fn(Option<&AttributeValue>) -> ConversionResult<ScalarValue>;

/// Stateless registry of per-kind readers and writers
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRegistry;

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry
    }

    /// Returns the reader registered for a kind
    pub fn reader(&self, kind: ScalarKind) -> ReadFn {
        match kind {
            ScalarKind::String => read_string,
            ScalarKind::Bool => read_bool,
            ScalarKind::Byte => read_byte,
            ScalarKind::Short => read_short,
            ScalarKind::Int => read_int,
            ScalarKind::Long => read_long,
            ScalarKind::Float => read_float,
            ScalarKind::Double => read_double,
            ScalarKind::Decimal => read_decimal,
            ScalarKind::Uuid => read_uuid,
            ScalarKind::DateTime => read_date_time,
            ScalarKind::DateTimeOffset => read_date_time_offset,
        }
    }

    /// Reads a scalar of the given kind.
    ///
    /// Nullable properties read an absent or null attribute as `ScalarValue::Null`.
    pub fn from_attribute(
        &self,
        value: Option<&AttributeValue>,
        kind: ScalarKind,
        nullable: bool,
    ) -> ConversionResult<ScalarValue> {
        read_scalar(self.reader(kind), value, nullable)
    }

    /// Writes a scalar as its attribute value.
    ///
    /// Numbers are written as invariant decimal text and date/times as
    /// ISO-8601 round-trip strings.
    pub fn to_attribute(&self, value: &ScalarValue) -> ConversionResult<AttributeValue> {
        let attribute = match value {
            ScalarValue::Null => AttributeValue::Null,
            ScalarValue::String(s) => AttributeValue::String(s.clone()),
            ScalarValue::Bool(b) => AttributeValue::Bool(*b),
            ScalarValue::Byte(v) => AttributeValue::number(v),
            ScalarValue::Short(v) => AttributeValue::number(v),
            ScalarValue::Int(v) => AttributeValue::number(v),
            ScalarValue::Long(v) => AttributeValue::number(v),
            ScalarValue::Float(v) => {
                if !v.is_finite() {
                    return Err(ConversionError::out_of_range(
                        ScalarKind::Float,
                        &v.to_string(),
                        "non-finite numbers have no decimal text form",
                    ));
                }
                AttributeValue::number(v)
            }
            ScalarValue::Double(v) => {
                if !v.is_finite() {
                    return Err(ConversionError::out_of_range(
                        ScalarKind::Double,
                        &v.to_string(),
                        "non-finite numbers have no decimal text form",
                    ));
                }
                AttributeValue::number(v)
            }
            ScalarValue::Decimal(d) => AttributeValue::number(d),
            ScalarValue::Uuid(u) => AttributeValue::String(u.hyphenated().to_string()),
            ScalarValue::DateTime(dt) => {
                let text = dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                check_iso_year(ScalarKind::DateTime, dt.year(), &text)?;
                AttributeValue::String(text)
            }
            ScalarValue::DateTimeOffset(dt) => {
                let text = dt.to_rfc3339_opts(SecondsFormat::AutoSi, false);
                check_iso_year(ScalarKind::DateTimeOffset, dt.year(), &text)?;
                AttributeValue::String(text)
            }
        };
        Ok(attribute)
    }
}

/// Applies nullable handling around a kind reader
pub fn read_scalar(
    reader: ReadFn,
    value: Option<&AttributeValue>,
    nullable: bool,
) -> ConversionResult<ScalarValue> {
    if nullable && matches!(value, None | Some(AttributeValue::Null)) {
        return Ok(ScalarValue::Null);
    }
    reader(value)
}

fn read_string(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    match value {
        Some(AttributeValue::String(s)) => Ok(ScalarValue::String(s.clone())),
        None | Some(AttributeValue::Null) => Ok(ScalarValue::String(String::new())),
        Some(other) => Err(ConversionError::wrong_shape(ScalarKind::String, other.shape_name())),
    }
}

fn read_bool(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    match value {
        Some(AttributeValue::Bool(b)) => Ok(ScalarValue::Bool(*b)),
        None | Some(AttributeValue::Null) => Ok(ScalarValue::Bool(false)),
        Some(other) => Err(ConversionError::wrong_shape(ScalarKind::Bool, other.shape_name())),
    }
}

/// Extracts the decimal text of a required number payload
fn number_text(kind: ScalarKind, value: Option<&AttributeValue>) -> ConversionResult<&str> {
    match value {
        Some(AttributeValue::Number(text)) => Ok(text),
        None | Some(AttributeValue::Null) => Err(ConversionError::missing(kind)),
        Some(other) => Err(ConversionError::wrong_shape(kind, other.shape_name())),
    }
}

fn parse_integral<T>(kind: ScalarKind, text: &str) -> ConversionResult<T>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    text.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionError::out_of_range(kind, text, e.to_string())
        }
        _ => ConversionError::malformed(kind, text, e.to_string()),
    })
}

fn read_byte(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Byte, value)?;
    parse_integral(ScalarKind::Byte, text).map(ScalarValue::Byte)
}

fn read_short(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Short, value)?;
    parse_integral(ScalarKind::Short, text).map(ScalarValue::Short)
}

fn read_int(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Int, value)?;
    parse_integral(ScalarKind::Int, text).map(ScalarValue::Int)
}

fn read_long(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Long, value)?;
    parse_integral(ScalarKind::Long, text).map(ScalarValue::Long)
}

fn read_float(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Float, value)?;
    let parsed = text
        .parse::<f32>()
        .map_err(|e| ConversionError::malformed(ScalarKind::Float, text, e.to_string()))?;
    if !parsed.is_finite() {
        return Err(ConversionError::out_of_range(
            ScalarKind::Float,
            text,
            "value does not fit a finite float",
        ));
    }
    Ok(ScalarValue::Float(parsed))
}

fn read_double(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Double, value)?;
    let parsed = text
        .parse::<f64>()
        .map_err(|e| ConversionError::malformed(ScalarKind::Double, text, e.to_string()))?;
    if !parsed.is_finite() {
        return Err(ConversionError::out_of_range(
            ScalarKind::Double,
            text,
            "value does not fit a finite double",
        ));
    }
    Ok(ScalarValue::Double(parsed))
}

fn read_decimal(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = number_text(ScalarKind::Decimal, value)?;
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed
        .map(ScalarValue::Decimal)
        .map_err(|e| ConversionError::malformed(ScalarKind::Decimal, text, e.to_string()))
}

fn read_uuid(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let text = match value {
        Some(AttributeValue::String(s)) => s,
        None | Some(AttributeValue::Null) => return Err(ConversionError::missing(ScalarKind::Uuid)),
        Some(other) => {
            return Err(ConversionError::wrong_shape(ScalarKind::Uuid, other.shape_name()))
        }
    };

    // Hyphenated 8-4-4-4-12 form only
    if text.len() != 36 {
        return Err(ConversionError::malformed(
            ScalarKind::Uuid,
            text,
            "expected hyphenated 36-character form",
        ));
    }
    Uuid::parse_str(text)
        .map(ScalarValue::Uuid)
        .map_err(|e| ConversionError::malformed(ScalarKind::Uuid, text, e.to_string()))
}

/// Round-trip text only has four-digit years; signed expanded years do not parse back
fn check_iso_year(kind: ScalarKind, year: i32, text: &str) -> ConversionResult<()> {
    if (0..=9999).contains(&year) {
        Ok(())
    } else {
        Err(ConversionError::out_of_range(
            kind,
            text,
            "year outside 0000-9999 has no ISO-8601 round-trip form",
        ))
    }
}

/// Parses ISO-8601 round-trip text, keeping the written offset.
///
/// Text without an offset is taken as UTC.
fn parse_iso8601(kind: ScalarKind, text: &str) -> ConversionResult<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| ConversionError::malformed(kind, text, format!("not ISO-8601: {}", e)))
}

/// Interprets decimal text as Unix-epoch seconds (fractions allowed)
fn parse_epoch_seconds(kind: ScalarKind, text: &str) -> ConversionResult<DateTime<Utc>> {
    let (secs, nanos) = match text.parse::<i64>() {
        Ok(secs) => (secs, 0u32),
        Err(_) => {
            let seconds = text
                .parse::<f64>()
                .map_err(|e| ConversionError::malformed(kind, text, e.to_string()))?;
            if !seconds.is_finite() {
                return Err(ConversionError::out_of_range(kind, text, "non-finite epoch seconds"));
            }
            let whole = seconds.floor();
            let nanos = ((seconds - whole) * 1_000_000_000.0).round() as u32;
            (whole as i64, nanos.min(999_999_999))
        }
    };

    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| ConversionError::out_of_range(kind, text, "epoch seconds out of range"))
}

/// Dual-format temporal read: string payload wins, then number, then default
fn read_temporal(
    kind: ScalarKind,
    value: Option<&AttributeValue>,
) -> ConversionResult<Option<DateTime<FixedOffset>>> {
    match value {
        Some(AttributeValue::String(text)) => parse_iso8601(kind, text).map(Some),
        Some(AttributeValue::Number(text)) => {
            parse_epoch_seconds(kind, text).map(|dt| Some(dt.fixed_offset()))
        }
        None | Some(AttributeValue::Null) => Ok(None),
        Some(other) => Err(ConversionError::wrong_shape(kind, other.shape_name())),
    }
}

fn read_date_time(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let parsed = read_temporal(ScalarKind::DateTime, value)?;
    Ok(ScalarValue::DateTime(
        parsed.map(|dt| dt.with_timezone(&Utc)).unwrap_or_default(),
    ))
}

fn read_date_time_offset(value: Option<&AttributeValue>) -> ConversionResult<ScalarValue> {
    let parsed = read_temporal(ScalarKind::DateTimeOffset, value)?;
    Ok(ScalarValue::DateTimeOffset(
        parsed.unwrap_or_else(|| DateTime::<Utc>::default().fixed_offset()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ConversionErrorCode;
    use chrono::TimeZone;

    fn roundtrip(value: ScalarValue) {
        let registry = TypeRegistry::new();
        let kind = value.kind().unwrap();
        let attribute = registry.to_attribute(&value).unwrap();
        let back = registry.from_attribute(Some(&attribute), kind, false).unwrap();
        assert_eq!(back, value, "round-trip through {}", attribute);
    }

    #[test]
    fn test_integral_roundtrip_boundaries() {
        roundtrip(ScalarValue::Byte(0));
        roundtrip(ScalarValue::Byte(u8::MAX));
        roundtrip(ScalarValue::Short(i16::MIN));
        roundtrip(ScalarValue::Int(0));
        roundtrip(ScalarValue::Int(-42));
        roundtrip(ScalarValue::Int(i32::MAX));
        roundtrip(ScalarValue::Long(i64::MIN));
        roundtrip(ScalarValue::Long(i64::MAX));
    }

    #[test]
    fn test_floating_roundtrip() {
        roundtrip(ScalarValue::Float(0.1));
        roundtrip(ScalarValue::Float(-3.5e-7));
        roundtrip(ScalarValue::Double(0.0));
        roundtrip(ScalarValue::Double(-1234.5678));
        roundtrip(ScalarValue::Double(f64::MAX));
        roundtrip(ScalarValue::Decimal(Decimal::from_str("79228162514264337593543950335").unwrap()));
        roundtrip(ScalarValue::Decimal(Decimal::from_str("-0.0001").unwrap()));
    }

    #[test]
    fn test_string_bool_uuid_roundtrip() {
        roundtrip(ScalarValue::String(String::new()));
        roundtrip(ScalarValue::String("héllo \"world\"".into()));
        roundtrip(ScalarValue::Bool(true));
        roundtrip(ScalarValue::Bool(false));
        roundtrip(ScalarValue::Uuid(Uuid::nil()));
        roundtrip(ScalarValue::Uuid(Uuid::new_v4()));
    }

    #[test]
    fn test_temporal_roundtrip() {
        roundtrip(ScalarValue::DateTime(DateTime::<Utc>::default()));
        roundtrip(ScalarValue::DateTime(
            Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
                + chrono::Duration::nanoseconds(999_999_900),
        ));
        let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        roundtrip(ScalarValue::DateTimeOffset(
            offset.with_ymd_and_hms(2024, 2, 29, 12, 0, 1).unwrap(),
        ));
    }

    #[test]
    fn test_dates_outside_four_digit_years_refused_on_write() {
        let registry = TypeRegistry::new();
        let far_future = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let before_year_zero = Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap();

        for dt in [far_future, before_year_zero] {
            let err = registry.to_attribute(&ScalarValue::DateTime(dt)).unwrap_err();
            assert_eq!(err.code(), ConversionErrorCode::AeroConversionOutOfRange);

            let err = registry
                .to_attribute(&ScalarValue::DateTimeOffset(dt.fixed_offset()))
                .unwrap_err();
            assert_eq!(err.code(), ConversionErrorCode::AeroConversionOutOfRange);
        }

        // Year 0 still has a four-digit form and reads back
        roundtrip(ScalarValue::DateTime(Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_numbers_written_as_decimal_text() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.to_attribute(&ScalarValue::Long(-7)).unwrap(),
            AttributeValue::Number("-7".into())
        );
        assert_eq!(
            registry.to_attribute(&ScalarValue::Double(1.5)).unwrap(),
            AttributeValue::Number("1.5".into())
        );
        assert_eq!(
            registry.to_attribute(&ScalarValue::Bool(true)).unwrap(),
            AttributeValue::Bool(true)
        );
    }

    #[test]
    fn test_dates_written_as_iso_strings() {
        let registry = TypeRegistry::new();
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            registry.to_attribute(&ScalarValue::DateTime(dt)).unwrap(),
            AttributeValue::String("2024-01-02T03:04:05Z".into())
        );
    }

    #[test]
    fn test_non_finite_write_rejected() {
        let registry = TypeRegistry::new();
        let err = registry.to_attribute(&ScalarValue::Double(f64::NAN)).unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionOutOfRange);
    }

    #[test]
    fn test_missing_string_and_bool_default() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.from_attribute(None, ScalarKind::String, false).unwrap(),
            ScalarValue::String(String::new())
        );
        assert_eq!(
            registry
                .from_attribute(Some(&AttributeValue::Null), ScalarKind::Bool, false)
                .unwrap(),
            ScalarValue::Bool(false)
        );
    }

    #[test]
    fn test_missing_number_is_error() {
        let registry = TypeRegistry::new();
        let err = registry.from_attribute(None, ScalarKind::Int, false).unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionMissing);
    }

    #[test]
    fn test_nullable_reads_null() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.from_attribute(None, ScalarKind::Int, true).unwrap(),
            ScalarValue::Null
        );
        assert_eq!(
            registry
                .from_attribute(Some(&AttributeValue::Null), ScalarKind::String, true)
                .unwrap(),
            ScalarValue::Null
        );
    }

    #[test]
    fn test_malformed_number_is_error() {
        let registry = TypeRegistry::new();
        let err = registry
            .from_attribute(Some(&AttributeValue::Number("12a".into())), ScalarKind::Int, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionMalformed);
        assert_eq!(err.observed(), "\"12a\"");
    }

    #[test]
    fn test_fractional_text_not_an_integer() {
        let registry = TypeRegistry::new();
        let err = registry
            .from_attribute(Some(&AttributeValue::Number("1.0".into())), ScalarKind::Long, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionMalformed);
    }

    #[test]
    fn test_integral_overflow_is_out_of_range() {
        let registry = TypeRegistry::new();
        let err = registry
            .from_attribute(Some(&AttributeValue::Number("256".into())), ScalarKind::Byte, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionOutOfRange);
    }

    #[test]
    fn test_wrong_variant_is_error() {
        let registry = TypeRegistry::new();
        let err = registry
            .from_attribute(Some(&AttributeValue::Number("1".into())), ScalarKind::Bool, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionWrongShape);

        let err = registry
            .from_attribute(Some(&AttributeValue::Bool(true)), ScalarKind::String, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionWrongShape);
    }

    #[test]
    fn test_uuid_strict_format() {
        let registry = TypeRegistry::new();
        let simple = AttributeValue::String("67e5504410b1426f9247bb680e5fe0c8".into());
        let err = registry
            .from_attribute(Some(&simple), ScalarKind::Uuid, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionMalformed);

        let garbage = AttributeValue::String("67e55044-10b1-426f-9247-bb680e5fe0cZ".into());
        assert!(registry.from_attribute(Some(&garbage), ScalarKind::Uuid, false).is_err());

        let valid = AttributeValue::String("67e55044-10b1-426f-9247-bb680e5fe0c8".into());
        assert!(registry.from_attribute(Some(&valid), ScalarKind::Uuid, false).is_ok());
    }

    #[test]
    fn test_epoch_zero_number_reads_as_epoch() {
        let registry = TypeRegistry::new();
        let value = registry
            .from_attribute(Some(&AttributeValue::Number("0".into())), ScalarKind::DateTime, false)
            .unwrap();
        assert_eq!(value, ScalarValue::DateTime(Utc.timestamp_opt(0, 0).unwrap()));
    }

    #[test]
    fn test_epoch_fractional_seconds() {
        let registry = TypeRegistry::new();
        let value = registry
            .from_attribute(
                Some(&AttributeValue::Number("1700000000.5".into())),
                ScalarKind::DateTime,
                false,
            )
            .unwrap();
        assert_eq!(
            value,
            ScalarValue::DateTime(Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap())
        );
    }

    #[test]
    fn test_temporal_default_when_absent() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.from_attribute(None, ScalarKind::DateTime, false).unwrap(),
            ScalarValue::DateTime(DateTime::<Utc>::default())
        );
        match registry
            .from_attribute(None, ScalarKind::DateTimeOffset, false)
            .unwrap()
        {
            ScalarValue::DateTimeOffset(dt) => assert_eq!(dt.timestamp(), 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_temporal_string_payload_used_before_number() {
        // A string payload is read as ISO-8601 even when it would also
        // parse as epoch seconds.
        let registry = TypeRegistry::new();
        let value = registry
            .from_attribute(
                Some(&AttributeValue::String("2020-05-06T07:08:09Z".into())),
                ScalarKind::DateTime,
                false,
            )
            .unwrap();
        assert_eq!(
            value,
            ScalarValue::DateTime(Utc.with_ymd_and_hms(2020, 5, 6, 7, 8, 9).unwrap())
        );

        let numeric_text = AttributeValue::String("0".into());
        let err = registry
            .from_attribute(Some(&numeric_text), ScalarKind::DateTime, false)
            .unwrap_err();
        assert_eq!(err.code(), ConversionErrorCode::AeroConversionMalformed);
    }

    #[test]
    fn test_naive_iso_text_read_as_utc() {
        let registry = TypeRegistry::new();
        let value = registry
            .from_attribute(
                Some(&AttributeValue::String("2021-03-04T05:06:07.25".into())),
                ScalarKind::DateTime,
                false,
            )
            .unwrap();
        assert_eq!(
            value,
            ScalarValue::DateTime(
                Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
                    + chrono::Duration::milliseconds(250)
            )
        );
    }
}
