//! Crate-level error
//!
//! Every subsystem keeps its own coded error type. `QueryError` unifies
//! them for callers that go through `QueryProvider`.

use thiserror::Error;

use crate::codec::ConversionError;
use crate::compiler::CompilerError;
use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::mapping::MappingError;
use crate::query::TranslationError;

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("{0}")]
    Translation(#[from] TranslationError),

    #[error("{0}")]
    Compiler(#[from] CompilerError),

    #[error("{0}")]
    Conversion(#[from] ConversionError),

    #[error("{0}")]
    Mapping(#[from] MappingError),

    #[error("{0}")]
    Executor(#[from] ExecutorError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl QueryError {
    /// Stable `AERO_…` code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Translation(e) => e.code().code(),
            QueryError::Compiler(e) => e.code().code(),
            QueryError::Conversion(e) => e.code().code(),
            QueryError::Mapping(e) => e.code().code(),
            QueryError::Executor(e) => e.code().code(),
            QueryError::Config(e) => e.code().code(),
        }
    }

    /// Caller programming error, as opposed to a data or store failure
    pub fn is_misuse(&self) -> bool {
        match self {
            QueryError::Compiler(e) => e.is_misuse(),
            QueryError::Executor(e) => e.is_misuse(),
            _ => false,
        }
    }

    /// Query shape the translator does not support
    pub fn is_unsupported(&self) -> bool {
        matches!(self, QueryError::Translation(e) if e.is_unsupported())
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err: QueryError = TranslationError::unsupported("filter", "predicate `x`").into();
        assert_eq!(err.code(), "AERO_QUERY_UNSUPPORTED_OPERATION");
        assert!(err.is_unsupported());
        assert!(!err.is_misuse());

        let err: QueryError = ExecutorError::sync_unsupported().into();
        assert_eq!(err.code(), "AERO_EXECUTION_SYNC_UNSUPPORTED");
        assert!(err.is_misuse());
    }

    #[test]
    fn test_display_is_inner_display() {
        let inner = CompilerError::not_compiled("User@users");
        let err = QueryError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}
