//! Query metrics
//!
//! Monotonic counters only, reset on process start. Relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_translated: AtomicU64,
    queries_rejected: AtomicU64,
    compilations: AtomicU64,
    cache_hits: AtomicU64,
    round_trips: AtomicU64,
    store_retries: AtomicU64,
    records_materialized: AtomicU64,
    enumerations_completed: AtomicU64,
    enumerations_failed: AtomicU64,
    enumerations_cancelled: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_translated(&self) {
        self.queries_translated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compilations(&self) {
        self.compilations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_round_trips(&self) {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_retries(&self) {
        self.store_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_materialized(&self, count: u64) {
        self.records_materialized.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_enumerations_completed(&self) {
        self.enumerations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_enumerations_failed(&self) {
        self.enumerations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_enumerations_cancelled(&self) {
        self.enumerations_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_translated: self.queries_translated.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            compilations: self.compilations.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            round_trips: self.round_trips.load(Ordering::Relaxed),
            store_retries: self.store_retries.load(Ordering::Relaxed),
            records_materialized: self.records_materialized.load(Ordering::Relaxed),
            enumerations_completed: self.enumerations_completed.load(Ordering::Relaxed),
            enumerations_failed: self.enumerations_failed.load(Ordering::Relaxed),
            enumerations_cancelled: self.enumerations_cancelled.load(Ordering::Relaxed),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_translated: u64,
    pub queries_rejected: u64,
    pub compilations: u64,
    pub cache_hits: u64,
    pub round_trips: u64,
    pub store_retries: u64,
    pub records_materialized: u64,
    pub enumerations_completed: u64,
    pub enumerations_failed: u64,
    pub enumerations_cancelled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.increment_round_trips();
        metrics.increment_round_trips();
        metrics.add_records_materialized(5);
        metrics.increment_enumerations_cancelled();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.round_trips, 2);
        assert_eq!(snapshot.records_materialized, 5);
        assert_eq!(snapshot.enumerations_cancelled, 1);

        let json = metrics.to_json();
        assert_eq!(json["round_trips"], 2);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment_cache_hits();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().cache_hits, 800);
    }
}
