//! Execution strategies
//!
//! A strategy wraps one store round trip with a retry policy. The cursor
//! never retries on its own; it hands the strategy a `Fetch` that can be
//! attempted any number of times without touching cursor state.

use std::time::Duration;

use crate::observability::{Diagnostics, Event};

use super::store::{StatementRequest, StoreClient, StoreError, StoreFuture};

/// A re-attemptable store round trip
pub struct Fetch<'a> {
    store: &'a dyn StoreClient,
    request: StatementRequest,
    diagnostics: &'a Diagnostics,
}

impl<'a> Fetch<'a> {
    pub fn new(
        store: &'a dyn StoreClient,
        request: StatementRequest,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            store,
            request,
            diagnostics,
        }
    }

    /// Sends the request once
    pub fn attempt(&self) -> StoreFuture<'a> {
        self.store.execute(self.request.clone())
    }

    pub fn request(&self) -> &StatementRequest {
        &self.request
    }

    /// Reports a retry about to happen
    pub fn report_retry(&self, attempt: u32, error: &StoreError, delay: Duration) {
        self.diagnostics.metrics().increment_store_retries();
        let attempt = attempt.to_string();
        let delay_ms = delay.as_millis().to_string();
        self.diagnostics.emit(
            Event::StoreRetry,
            &[
                ("attempt", attempt.as_str()),
                ("delay_ms", delay_ms.as_str()),
                ("error", error.message()),
            ],
        );
    }
}

/// Retry policy around a single round trip
pub trait ExecutionStrategy: Send + Sync {
    fn run<'a>(&'a self, fetch: Fetch<'a>) -> StoreFuture<'a>;
}

/// Single attempt; every error propagates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl ExecutionStrategy for NoRetry {
    fn run<'a>(&'a self, fetch: Fetch<'a>) -> StoreFuture<'a> {
        Box::pin(async move { fetch.attempt().await })
    }
}

/// Capped exponential backoff on transient errors only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryWithBackoff {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryWithBackoff {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryWithBackoff {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50), Duration::from_millis(2000))
    }
}

impl ExecutionStrategy for RetryWithBackoff {
    fn run<'a>(&'a self, fetch: Fetch<'a>) -> StoreFuture<'a> {
        Box::pin(async move {
            let mut retries = 0u32;
            loop {
                match fetch.attempt().await {
                    Ok(page) => return Ok(page),
                    Err(err) if err.is_transient() && retries < self.max_retries => {
                        retries += 1;
                        let delay = self.delay_for(retries);
                        fetch.report_retry(retries, &err, delay);
                        tokio::time::sleep(delay).await;
                    }
                    Err(err) => return Err(err.with_attempts(retries + 1)),
                }
            }
        })
    }
}
