//! Executor error types
//!
//! Error codes:
//! - AERO_EXECUTION_STORE_FAILED (ERROR)
//! - AERO_EXECUTION_MATERIALIZATION_FAILED (ERROR)
//! - AERO_EXECUTION_CANCELLED (ERROR)
//! - AERO_EXECUTION_SYNC_UNSUPPORTED (MISUSE)
//! - AERO_EXECUTION_RESUME_MISMATCH (MISUSE)

use std::fmt;

use crate::codec::ConversionError;

use super::store::StoreError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Enumeration failed
    Error,
    /// Programming error by the caller; never retried
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

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Store error past the execution strategy's retry ceiling
    AeroExecutionStoreFailed,
    /// A record could not be converted to its entity
    AeroExecutionMaterializationFailed,
    /// Cancellation signal observed
    AeroExecutionCancelled,
    /// Blocking enumeration attempted
    AeroExecutionSyncUnsupported,
    /// Resume token issued for a different statement
    AeroExecutionResumeMismatch,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::AeroExecutionStoreFailed => "AERO_EXECUTION_STORE_FAILED",
            ExecutorErrorCode::AeroExecutionMaterializationFailed => {
                "AERO_EXECUTION_MATERIALIZATION_FAILED"
            }
            ExecutorErrorCode::AeroExecutionCancelled => "AERO_EXECUTION_CANCELLED",
            ExecutorErrorCode::AeroExecutionSyncUnsupported => "AERO_EXECUTION_SYNC_UNSUPPORTED",
            ExecutorErrorCode::AeroExecutionResumeMismatch => "AERO_EXECUTION_RESUME_MISMATCH",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::AeroExecutionSyncUnsupported
            | ExecutorErrorCode::AeroExecutionResumeMismatch => Severity::Misuse,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error with the underlying cause, if any
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    table: Option<String>,
    conversion: Option<ConversionError>,
    store: Option<StoreError>,
}

impl ExecutorError {
    fn new(code: ExecutorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            table: None,
            conversion: None,
            store: None,
        }
    }

    /// Store failure that the execution strategy gave up on
    pub fn store_failed(table: &str, err: StoreError) -> Self {
        let mut e = Self::new(
            ExecutorErrorCode::AeroExecutionStoreFailed,
            format!("store request for table '{}' failed: {}", table, err),
        );
        e.table = Some(table.to_string());
        e.store = Some(err);
        e
    }

    /// Record conversion failure; the conversion error carries table and position
    pub fn materialization(err: ConversionError) -> Self {
        let mut e = Self::new(
            ExecutorErrorCode::AeroExecutionMaterializationFailed,
            format!("record could not be materialized: {}", err),
        );
        e.table = err.table().map(str::to_string);
        e.conversion = Some(err);
        e
    }

    pub fn cancelled(table: &str) -> Self {
        let mut e = Self::new(
            ExecutorErrorCode::AeroExecutionCancelled,
            format!("enumeration over table '{}' was cancelled", table),
        );
        e.table = Some(table.to_string());
        e
    }

    pub fn sync_unsupported() -> Self {
        Self::new(
            ExecutorErrorCode::AeroExecutionSyncUnsupported,
            "synchronous enumeration is not supported; use the asynchronous form",
        )
    }

    pub fn resume_mismatch(table: &str) -> Self {
        let mut e = Self::new(
            ExecutorErrorCode::AeroExecutionResumeMismatch,
            format!(
                "resume token was issued for a different statement than the query over table '{}'",
                table
            ),
        );
        e.table = Some(table.to_string());
        e
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Underlying conversion error, for materialization failures
    pub fn conversion(&self) -> Option<&ConversionError> {
        self.conversion.as_ref()
    }

    /// Underlying store error, for store failures
    pub fn store_error(&self) -> Option<&StoreError> {
        self.store.as_ref()
    }

    pub fn is_misuse(&self) -> bool {
        self.severity() == Severity::Misuse
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ExecutorErrorCode::AeroExecutionCancelled
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Some(ref conversion) = self.conversion {
            return Some(conversion);
        }
        self.store
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
