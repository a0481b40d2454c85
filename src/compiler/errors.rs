//! Compiler error types
//!
//! Error codes:
//! - AERO_COMPILER_UNBOUND_PROPERTY (ERROR)
//! - AERO_COMPILER_PLAN_SHAPE (ERROR)
//! - AERO_CACHE_NOT_COMPILED (MISUSE)

use std::fmt;

/// Severity levels for compiler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Internal lowering failure
    Error,
    /// Programming error by the caller
    Misuse,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Misuse => write!(f, "MISUSE"),
        }
    }
}

/// Compiler error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerErrorCode {
    /// A property access could not be bound to a store attribute
    AeroCompilerUnboundProperty,
    /// A plan node appeared where the lowering step does not accept it
    AeroCompilerPlanShape,
    /// Cache lookup for a model that was never compiled
    AeroCacheNotCompiled,
}

impl CompilerErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            CompilerErrorCode::AeroCompilerUnboundProperty => "AERO_COMPILER_UNBOUND_PROPERTY",
            CompilerErrorCode::AeroCompilerPlanShape => "AERO_COMPILER_PLAN_SHAPE",
            CompilerErrorCode::AeroCacheNotCompiled => "AERO_CACHE_NOT_COMPILED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CompilerErrorCode::AeroCacheNotCompiled => Severity::Misuse,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for CompilerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compiler error
#[derive(Debug, Clone)]
pub struct CompilerError {
    code: CompilerErrorCode,
    message: String,
}

impl CompilerError {
    /// Property access with no attribute binding in the model
    pub fn unbound_property(property: &str, table: &str) -> Self {
        Self {
            code: CompilerErrorCode::AeroCompilerUnboundProperty,
            message: format!(
                "property '{}' has no attribute binding in table '{}'",
                property, table
            ),
        }
    }

    /// Unexpected plan node for a lowering step
    pub fn plan_shape(stage: &str, found: &str) -> Self {
        Self {
            code: CompilerErrorCode::AeroCompilerPlanShape,
            message: format!("{} stage cannot lower a {} node", stage, found),
        }
    }

    /// Cache lookup before compilation
    pub fn not_compiled(key: &str) -> Self {
        Self {
            code: CompilerErrorCode::AeroCacheNotCompiled,
            message: format!("no compiled query for model '{}'; compile it first", key),
        }
    }

    pub fn code(&self) -> CompilerErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_misuse(&self) -> bool {
        self.code.severity() == Severity::Misuse
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code, self.message)
    }
}

impl std::error::Error for CompilerError {}

/// Result type for compilation
pub type CompilerResult<T> = Result<T, CompilerError>;
