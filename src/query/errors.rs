//! Translation error types
//!
//! Error codes:
//! - AERO_QUERY_UNSUPPORTED_OPERATION (REJECT)
//! - AERO_QUERY_INVALID (REJECT)
//! - AERO_QUERY_MAPPING_FAILED (REJECT)

use std::fmt;

use crate::mapping::MappingError;

/// Translation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationErrorCode {
    /// Query shape beyond a flat full-projection fetch
    AeroQueryUnsupportedOperation,
    /// Structurally invalid query or options
    AeroQueryInvalid,
    /// Mapping metadata could not be resolved
    AeroQueryMappingFailed,
}

impl TranslationErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            TranslationErrorCode::AeroQueryUnsupportedOperation => {
                "AERO_QUERY_UNSUPPORTED_OPERATION"
            }
            TranslationErrorCode::AeroQueryInvalid => "AERO_QUERY_INVALID",
            TranslationErrorCode::AeroQueryMappingFailed => "AERO_QUERY_MAPPING_FAILED",
        }
    }
}

impl fmt::Display for TranslationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Translation error. Always raised before any store request.
#[derive(Debug, Clone)]
pub struct TranslationError {
    code: TranslationErrorCode,
    message: String,
    construct: Option<String>,
}

impl TranslationError {
    /// Unsupported query construct (filter, ordering, join, ...)
    pub fn unsupported(construct: impl Into<String>, detail: impl Into<String>) -> Self {
        let construct = construct.into();
        Self {
            code: TranslationErrorCode::AeroQueryUnsupportedOperation,
            message: format!(
                "Unsupported operation '{}': {}",
                construct,
                detail.into()
            ),
            construct: Some(construct),
        }
    }

    /// Invalid query structure or option value
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            code: TranslationErrorCode::AeroQueryInvalid,
            message: reason.into(),
            construct: None,
        }
    }

    /// Mapping metadata lookup failed
    pub fn mapping(err: MappingError) -> Self {
        Self {
            code: TranslationErrorCode::AeroQueryMappingFailed,
            message: err.to_string(),
            construct: None,
        }
    }

    pub fn code(&self) -> TranslationErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The offending construct, for unsupported operations
    pub fn construct(&self) -> Option<&str> {
        self.construct.as_deref()
    }

    pub fn is_unsupported(&self) -> bool {
        self.code == TranslationErrorCode::AeroQueryUnsupportedOperation
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code, self.message)
    }
}

impl std::error::Error for TranslationError {}

impl From<MappingError> for TranslationError {
    fn from(err: MappingError) -> Self {
        TranslationError::mapping(err)
    }
}

/// Result type for translation
pub type TranslationResult<T> = Result<T, TranslationError>;
