//! Store transport contract
//!
//! The executor talks to the remote store only through `StoreClient`.
//! Implementations apply their own timeouts and low-level retries and
//! classify every failure as transient or fatal; the executor never
//! reinterprets that classification.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::attribute::Record;

/// One statement round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRequest {
    /// Statement text, exactly as compiled
    pub statement: String,
    /// Continuation token from the previous page, verbatim
    pub next_token: Option<String>,
    /// Requested page size; `None` lets the store choose
    pub limit: Option<u32>,
}

/// One page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    /// Absent on the last page. Present does not imply the next page is non-empty.
    pub next_token: Option<String>,
}

impl Page {
    pub fn new(records: Vec<Record>, next_token: Option<String>) -> Self {
        Self {
            records,
            next_token,
        }
    }

    /// Final page
    pub fn last(records: Vec<Record>) -> Self {
        Self::new(records, None)
    }
}

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// May succeed if retried
    AeroStoreTransient,
    /// Retrying will not help
    AeroStoreFatal,
}

impl StoreErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::AeroStoreTransient => "AERO_STORE_TRANSIENT",
            StoreErrorCode::AeroStoreFatal => "AERO_STORE_FATAL",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Transport-level failure as classified by the store client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    attempts: u32,
}

impl StoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::AeroStoreTransient,
            message: message.into(),
            attempts: 1,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::AeroStoreFatal,
            message: message.into(),
            attempts: 1,
        }
    }

    /// Records how many attempts were made before giving up
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_transient(&self) -> bool {
        self.code == StoreErrorCode::AeroStoreTransient
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if self.attempts > 1 {
            write!(f, " (after {} attempts)", self.attempts)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// Result type for store round trips
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future returned by store clients
pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = StoreResult<Page>> + Send + 'a>>;

/// Remote store transport.
///
/// Shared between unrelated queries; implementations must tolerate
/// interleaved calls.
pub trait StoreClient: Send + Sync {
    fn execute(&self, request: StatementRequest) -> StoreFuture<'_>;
}
