//! Observable events
//!
//! Events are explicit and typed. Each carries a fixed severity.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Translation and compilation
    /// Expression translated to a query model
    QueryTranslated,
    /// Expression rejected before any store request
    QueryRejected,
    /// New compilation stored in the cache
    QueryCompiled,
    /// Compilation served from the cache
    CompiledQueryCacheHit,

    // Execution
    /// About to send statement text to the store
    QueryExecuting,
    /// One store round trip finished
    RoundTripCompleted,
    /// Transient store failure, retrying
    StoreRetry,
    /// Enumeration reached the end of the result set
    EnumerationExhausted,
    /// Enumeration stopped by a cancellation signal
    EnumerationCancelled,
    /// A record could not be materialized
    MaterializationFailed,
    /// Store failure past the retry ceiling
    StoreFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryTranslated => "QUERY_TRANSLATED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryCompiled => "QUERY_COMPILED",
            Event::CompiledQueryCacheHit => "COMPILED_QUERY_CACHE_HIT",
            Event::QueryExecuting => "QUERY_EXECUTING",
            Event::RoundTripCompleted => "ROUND_TRIP_COMPLETED",
            Event::StoreRetry => "STORE_RETRY",
            Event::EnumerationExhausted => "ENUMERATION_EXHAUSTED",
            Event::EnumerationCancelled => "ENUMERATION_CANCELLED",
            Event::MaterializationFailed => "MATERIALIZATION_FAILED",
            Event::StoreFailed => "STORE_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryExecuting | Event::RoundTripCompleted | Event::CompiledQueryCacheHit => {
                Severity::Trace
            }
            Event::QueryRejected | Event::StoreRetry | Event::EnumerationCancelled => {
                Severity::Warn
            }
            Event::MaterializationFailed | Event::StoreFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
