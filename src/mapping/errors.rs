//! Mapping error types
//!
//! Error codes:
//! - AERO_MAPPING_UNKNOWN_ENTITY (REJECT)
//! - AERO_MAPPING_INVALID (REJECT)

use std::fmt;

/// Mapping error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingErrorCode {
    /// No mapping declared for the entity shape
    AeroMappingUnknownEntity,
    /// Mapping declaration is structurally invalid
    AeroMappingInvalid,
}

impl MappingErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            MappingErrorCode::AeroMappingUnknownEntity => "AERO_MAPPING_UNKNOWN_ENTITY",
            MappingErrorCode::AeroMappingInvalid => "AERO_MAPPING_INVALID",
        }
    }
}

impl fmt::Display for MappingErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Mapping error with entity context
#[derive(Debug, Clone)]
pub struct MappingError {
    code: MappingErrorCode,
    entity: String,
    message: String,
}

impl MappingError {
    /// No mapping is declared for this entity
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            code: MappingErrorCode::AeroMappingUnknownEntity,
            message: format!("No mapping declared for entity '{}'", entity),
            entity,
        }
    }

    /// Mapping declaration is invalid
    pub fn invalid(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: MappingErrorCode::AeroMappingInvalid,
            entity: entity.into(),
            message: reason.into(),
        }
    }

    pub fn code(&self) -> MappingErrorCode {
        self.code
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code, self.message)?;
        if self.code == MappingErrorCode::AeroMappingInvalid {
            write!(f, " [entity '{}']", self.entity)?;
        }
        Ok(())
    }
}

impl std::error::Error for MappingError {}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;
