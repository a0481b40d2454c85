//! Paginated query cursor
//!
//! Per-enumeration state machine:
//!
//! ```text
//! NotStarted -> Fetching -> (Materializing -> Fetching)* -> Exhausted
//!                  |                |
//!                  +-> Failed <-----+        (store or conversion error)
//!                  +-> Cancelled             (cancellation signal)
//! ```
//!
//! - The only suspension point is the store round trip
//! - Records are materialized one at a time as they are pulled, so a bad
//!   record fails exactly at its position
//! - Continuation tokens are passed back verbatim; an empty page with a
//!   token keeps fetching, a missing token ends the enumeration
//! - State only advances after a round trip succeeds, so a fetch can be
//!   attempted again by the execution strategy
//!
//! A cursor is owned by exactly one enumeration. The compiled query, the
//! store client and the strategy are shared.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::attribute::Record;
use crate::codec::ConversionError;
use crate::compiler::CompiledQuery;
use crate::entity::{FromRow, Row};
use crate::observability::{Diagnostics, Event};

use super::errors::{ExecutorError, ExecutorResult};
use super::store::{Page, StatementRequest, StoreClient};
use super::strategy::{ExecutionStrategy, Fetch};

/// Enumeration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    NotStarted,
    Fetching,
    Materializing,
    Exhausted,
    Failed,
    Cancelled,
}

impl CursorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorState::NotStarted => "NOT_STARTED",
            CursorState::Fetching => "FETCHING",
            CursorState::Materializing => "MATERIALIZING",
            CursorState::Exhausted => "EXHAUSTED",
            CursorState::Failed => "FAILED",
            CursorState::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CursorState::Exhausted | CursorState::Failed | CursorState::Cancelled
        )
    }
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Effective per-enumeration options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSettings {
    /// Requested page size; `None` lets the store choose
    pub page_size: Option<u32>,
    /// Follow continuation tokens; when false only the first page is read
    pub auto_paginate: bool,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            page_size: None,
            auto_paginate: true,
        }
    }
}

/// Continuation point that can be handed back to resume a query later.
///
/// Bound to the statement it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeToken {
    /// Fingerprint of the statement text
    pub fingerprint: String,
    /// Raw store continuation token
    pub token: String,
}

impl ResumeToken {
    /// Opaque text form
    pub fn encode(&self) -> serde_json::Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parses the text form produced by `encode`
    pub fn decode(text: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(text.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Cursor over one compiled query
pub struct QueryCursor {
    query: Arc<CompiledQuery>,
    store: Arc<dyn StoreClient>,
    strategy: Arc<dyn ExecutionStrategy>,
    diagnostics: Diagnostics,
    cancellation: CancellationToken,
    settings: CursorSettings,
    state: CursorState,
    next_token: Option<String>,
    buffer: VecDeque<Record>,
    position: u64,
    pages_fetched: u64,
}

impl QueryCursor {
    pub fn new(
        query: Arc<CompiledQuery>,
        store: Arc<dyn StoreClient>,
        strategy: Arc<dyn ExecutionStrategy>,
        diagnostics: Diagnostics,
        settings: CursorSettings,
    ) -> Self {
        Self {
            query,
            store,
            strategy,
            diagnostics,
            cancellation: CancellationToken::new(),
            settings,
            state: CursorState::NotStarted,
            next_token: None,
            buffer: VecDeque::new(),
            position: 0,
            pages_fetched: 0,
        }
    }

    /// Observes the given cancellation signal
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Starts from a previously issued resume token instead of the first page.
    ///
    /// Fails if the token belongs to a different statement.
    pub fn resume_from(mut self, token: &ResumeToken) -> ExecutorResult<Self> {
        if token.fingerprint != self.query.fingerprint() {
            return Err(ExecutorError::resume_mismatch(self.query.table()));
        }
        self.next_token = Some(token.token.clone());
        Ok(self)
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn query(&self) -> &CompiledQuery {
        &self.query
    }

    /// Records handed to the materializer so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Token for continuing where the last fetched page left off.
    ///
    /// Only meaningful once the buffered page has been consumed; records
    /// still buffered are not covered by it.
    pub fn resume_token(&self) -> Option<ResumeToken> {
        self.next_token.as_ref().map(|token| ResumeToken {
            fingerprint: self.query.fingerprint().to_string(),
            token: token.clone(),
        })
    }

    /// Advances to the next entity.
    ///
    /// Returns `Ok(None)` once the enumeration has ended; a failed or
    /// cancelled cursor reports its error once and then yields nothing.
    pub async fn next(&mut self) -> ExecutorResult<Option<Row>> {
        loop {
            if self.state.is_terminal() {
                return Ok(None);
            }
            if self.cancellation.is_cancelled() {
                return Err(self.cancel());
            }

            match self.state {
                CursorState::NotStarted | CursorState::Fetching => self.fetch_page().await?,
                CursorState::Materializing => match self.buffer.pop_front() {
                    Some(record) => return self.materialize(&record).map(Some),
                    None => {
                        if self.next_token.is_some() && self.settings.auto_paginate {
                            self.state = CursorState::Fetching;
                        } else {
                            self.finish();
                            return Ok(None);
                        }
                    }
                },
                CursorState::Exhausted | CursorState::Failed | CursorState::Cancelled => {
                    return Ok(None)
                }
            }
        }
    }

    /// Advances and converts to a typed entity
    pub async fn next_as<T: FromRow>(&mut self) -> ExecutorResult<Option<T>> {
        match self.next().await? {
            Some(row) => match T::from_row(row) {
                Ok(entity) => Ok(Some(entity)),
                Err(err) => {
                    let position = self.position.saturating_sub(1);
                    let err = err
                        .with_table(self.query.table())
                        .with_record_position(position);
                    Err(self.fail_materialization(err))
                }
            },
            None => Ok(None),
        }
    }

    /// Drains the cursor
    pub async fn collect_all<T: FromRow>(mut self) -> ExecutorResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_as::<T>().await? {
            items.push(item);
        }
        Ok(items)
    }

    async fn fetch_page(&mut self) -> ExecutorResult<()> {
        self.state = CursorState::Fetching;

        let request = StatementRequest {
            statement: self.query.statement().to_string(),
            next_token: self.next_token.clone(),
            limit: self.settings.page_size,
        };

        let page_size = request
            .limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "default".to_string());
        self.diagnostics.emit(
            Event::QueryExecuting,
            &[
                ("statement", request.statement.as_str()),
                ("table", self.query.table()),
                ("next_token", request.next_token.as_deref().unwrap_or("")),
                ("page_size", page_size.as_str()),
            ],
        );

        let started = Instant::now();
        let fetch = Fetch::new(self.store.as_ref(), request, &self.diagnostics);
        let outcome = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => None,
            result = self.strategy.run(fetch) => Some(result),
        };

        let page = match outcome {
            None => return Err(self.cancel()),
            Some(Err(err)) => {
                self.state = CursorState::Failed;
                self.diagnostics.metrics().increment_enumerations_failed();
                self.diagnostics.emit(
                    Event::StoreFailed,
                    &[("table", self.query.table()), ("error", err.message())],
                );
                return Err(ExecutorError::store_failed(self.query.table(), err));
            }
            Some(Ok(page)) => page,
        };

        self.accept_page(page, started.elapsed().as_millis());
        Ok(())
    }

    fn accept_page(&mut self, page: Page, elapsed_ms: u128) {
        self.pages_fetched += 1;
        self.diagnostics.metrics().increment_round_trips();

        let records = page.records.len().to_string();
        let elapsed = elapsed_ms.to_string();
        let has_token = page.next_token.is_some().to_string();
        self.diagnostics.emit(
            Event::RoundTripCompleted,
            &[
                ("table", self.query.table()),
                ("records", records.as_str()),
                ("has_next_token", has_token.as_str()),
                ("elapsed_ms", elapsed.as_str()),
            ],
        );

        self.next_token = page.next_token;
        self.buffer.extend(page.records);
        self.state = CursorState::Materializing;
    }

    fn materialize(&mut self, record: &Record) -> ExecutorResult<Row> {
        let position = self.position;
        self.position += 1;

        match self.query.materializer().materialize(record) {
            Ok(row) => {
                self.diagnostics.metrics().add_records_materialized(1);
                Ok(row)
            }
            Err(err) => {
                let err = err
                    .with_table(self.query.table())
                    .with_record_position(position);
                Err(self.fail_materialization(err))
            }
        }
    }

    fn fail_materialization(&mut self, err: ConversionError) -> ExecutorError {
        self.state = CursorState::Failed;
        self.buffer.clear();
        self.diagnostics.metrics().increment_enumerations_failed();

        let position = err
            .record_position()
            .map(|p| p.to_string())
            .unwrap_or_default();
        self.diagnostics.emit(
            Event::MaterializationFailed,
            &[
                ("table", self.query.table()),
                ("property", err.property().unwrap_or("")),
                ("attribute", err.attribute().unwrap_or("")),
                ("position", position.as_str()),
                ("error", err.reason()),
            ],
        );
        ExecutorError::materialization(err)
    }

    fn cancel(&mut self) -> ExecutorError {
        self.state = CursorState::Cancelled;
        self.buffer.clear();
        self.diagnostics.metrics().increment_enumerations_cancelled();

        let position = self.position.to_string();
        self.diagnostics.emit(
            Event::EnumerationCancelled,
            &[("table", self.query.table()), ("position", position.as_str())],
        );
        ExecutorError::cancelled(self.query.table())
    }

    fn finish(&mut self) {
        self.state = CursorState::Exhausted;
        self.diagnostics.metrics().increment_enumerations_completed();

        let records = self.position.to_string();
        let pages = self.pages_fetched.to_string();
        self.diagnostics.emit(
            Event::EnumerationExhausted,
            &[
                ("table", self.query.table()),
                ("records", records.as_str()),
                ("pages", pages.as_str()),
            ],
        );
    }
}

impl fmt::Debug for QueryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCursor")
            .field("table", &self.query.table())
            .field("state", &self.state)
            .field("next_token", &self.next_token)
            .field("buffered", &self.buffer.len())
            .field("position", &self.position)
            .finish()
    }
}
