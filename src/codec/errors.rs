//! Conversion error types
//!
//! Error codes:
//! - AERO_CONVERSION_MALFORMED (ERROR)
//! - AERO_CONVERSION_WRONG_SHAPE (ERROR)
//! - AERO_CONVERSION_MISSING (ERROR)
//! - AERO_CONVERSION_OUT_OF_RANGE (ERROR)

use std::fmt;

use super::kind::ScalarKind;

/// Conversion error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorCode {
    /// Payload text cannot be parsed into the declared kind
    AeroConversionMalformed,
    /// A different attribute variant is present than the kind requires
    AeroConversionWrongShape,
    /// Required attribute absent and the kind has no sparse default
    AeroConversionMissing,
    /// Parsed value does not fit the declared kind
    AeroConversionOutOfRange,
}

impl ConversionErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ConversionErrorCode::AeroConversionMalformed => "AERO_CONVERSION_MALFORMED",
            ConversionErrorCode::AeroConversionWrongShape => "AERO_CONVERSION_WRONG_SHAPE",
            ConversionErrorCode::AeroConversionMissing => "AERO_CONVERSION_MISSING",
            ConversionErrorCode::AeroConversionOutOfRange => "AERO_CONVERSION_OUT_OF_RANGE",
        }
    }
}

impl fmt::Display for ConversionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Conversion failure with the context needed to diagnose it
/// without looking at the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    code: ConversionErrorCode,
    kind: ScalarKind,
    observed: String,
    reason: String,
    property: Option<String>,
    attribute: Option<String>,
    table: Option<String>,
    record_position: Option<u64>,
}

impl ConversionError {
    fn new(
        code: ConversionErrorCode,
        kind: ScalarKind,
        observed: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            code,
            kind,
            observed: observed.into(),
            reason: reason.into(),
            property: None,
            attribute: None,
            table: None,
            record_position: None,
        }
    }

    /// Payload text could not be parsed
    pub fn malformed(kind: ScalarKind, text: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ConversionErrorCode::AeroConversionMalformed,
            kind,
            format!("{:?}", text),
            reason,
        )
    }

    /// Wrong attribute variant for the declared kind
    pub fn wrong_shape(kind: ScalarKind, observed_shape: &str) -> Self {
        Self::new(
            ConversionErrorCode::AeroConversionWrongShape,
            kind,
            observed_shape,
            format!("expected {} payload", kind.wire_shape()),
        )
    }

    /// Attribute absent with no default for this kind
    pub fn missing(kind: ScalarKind) -> Self {
        Self::new(
            ConversionErrorCode::AeroConversionMissing,
            kind,
            "absent",
            "attribute is required for this kind",
        )
    }

    /// Value outside the representable range
    pub fn out_of_range(kind: ScalarKind, text: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ConversionErrorCode::AeroConversionOutOfRange,
            kind,
            format!("{:?}", text),
            reason,
        )
    }

    /// Attaches the property being materialized and its store attribute
    pub fn with_property(mut self, property: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self.attribute = Some(attribute.into());
        self
    }

    /// Attaches the table the record came from
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Attaches the zero-based position of the record in the enumeration
    pub fn with_record_position(mut self, position: u64) -> Self {
        self.record_position = Some(position);
        self
    }

    pub fn code(&self) -> ConversionErrorCode {
        self.code
    }

    /// Declared kind that was being read or written
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Observed payload or shape
    pub fn observed(&self) -> &str {
        &self.observed
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn record_position(&self) -> Option<u64> {
        self.record_position
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ERROR] {}: cannot convert {} to {} ({})",
            self.code, self.observed, self.kind, self.reason
        )?;
        if let (Some(property), Some(attribute)) = (&self.property, &self.attribute) {
            write!(f, " [property '{}' <- attribute '{}']", property, attribute)?;
        }
        if let Some(table) = &self.table {
            write!(f, " [table '{}']", table)?;
        }
        if let Some(position) = self.record_position {
            write!(f, " [record #{}]", position)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConversionError {}

/// Result type for codec operations
pub type ConversionResult<T> = Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConversionErrorCode::AeroConversionMalformed.code(),
            "AERO_CONVERSION_MALFORMED"
        );
        assert_eq!(
            ConversionErrorCode::AeroConversionWrongShape.code(),
            "AERO_CONVERSION_WRONG_SHAPE"
        );
        assert_eq!(
            ConversionErrorCode::AeroConversionMissing.code(),
            "AERO_CONVERSION_MISSING"
        );
    }

    #[test]
    fn test_display_carries_full_context() {
        let err = ConversionError::malformed(ScalarKind::Int, "abc", "invalid digit")
            .with_property("Age", "age")
            .with_table("Users")
            .with_record_position(7);

        let display = err.to_string();
        assert!(display.contains("AERO_CONVERSION_MALFORMED"));
        assert!(display.contains("\"abc\""));
        assert!(display.contains("int"));
        assert!(display.contains("'Age'"));
        assert!(display.contains("'age'"));
        assert!(display.contains("'Users'"));
        assert!(display.contains("#7"));
    }

    #[test]
    fn test_wrong_shape_names_expected_payload() {
        let err = ConversionError::wrong_shape(ScalarKind::Bool, "string");
        assert_eq!(err.observed(), "string");
        assert!(err.reason().contains("bool"));
    }
}
