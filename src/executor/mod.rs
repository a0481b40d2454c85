//! Query executor
//!
//! Drives paginated execution of a compiled query against the store and
//! yields materialized entities lazily.
//!
//! # Guarantees
//!
//! - Elements arrive in page order, then record order within a page
//! - One store round trip per suspension point, nothing fetched ahead
//! - Retry policy lives in the `ExecutionStrategy`, never in the cursor
//! - Cancellation while awaiting the store aborts the round trip and
//!   yields nothing from the in-flight page

mod cursor;
mod errors;
mod store;
mod strategy;
mod stream;

pub use cursor::{CursorSettings, CursorState, QueryCursor, ResumeToken};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use store::{
    Page, StatementRequest, StoreClient, StoreError, StoreErrorCode, StoreFuture, StoreResult,
};
pub use strategy::{ExecutionStrategy, Fetch, NoRetry, RetryWithBackoff};
pub use stream::{entity_stream, EntityStream};
