//! Diagnostics sinks
//!
//! Purely observational: `emit` cannot fail and nothing reads its outcome.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::events::Event;
use super::logger::{Logger, Severity};
use super::metrics::MetricsRegistry;

/// Receiver of structured diagnostic events
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, event: Event, fields: &[(&str, &str)]);
}

/// Writes events through the JSON logger
#[derive(Debug, Clone, Copy)]
pub struct LoggerSink {
    min_severity: Severity,
    stderr_only: bool,
}

impl LoggerSink {
    pub fn new(min_severity: Severity) -> Self {
        Self {
            min_severity,
            stderr_only: false,
        }
    }

    /// Sends every event to stderr, leaving stdout to the caller's output
    pub fn stderr(min_severity: Severity) -> Self {
        Self {
            min_severity,
            stderr_only: true,
        }
    }

    pub fn is_stderr_only(&self) -> bool {
        self.stderr_only
    }
}

impl Default for LoggerSink {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl DiagnosticsSink for LoggerSink {
    fn emit(&self, event: Event, fields: &[(&str, &str)]) {
        let severity = event.severity();
        if severity < self.min_severity {
            return;
        }
        if self.stderr_only {
            Logger::log_stderr(severity, event.as_str(), fields);
        } else {
            Logger::log(severity, event.as_str(), fields);
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _event: Event, _fields: &[(&str, &str)]) {}
}

/// One captured event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub event: Event,
    pub fields: BTreeMap<String, String>,
}

impl DiagnosticRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Keeps events in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.records().iter().filter(|r| r.event == event).count()
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, event: Event, fields: &[(&str, &str)]) {
        let record = DiagnosticRecord {
            event,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Sink plus counters, shared by everything one provider runs
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
    metrics: Arc<MetricsRegistry>,
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            sink,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Logger output on stderr only
    pub fn stderr() -> Self {
        Self::new(Arc::new(LoggerSink::stderr(Severity::Info)))
    }

    /// No events, fresh counters
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn emit(&self, event: Event, fields: &[(&str, &str)]) {
        self.sink.emit(event, fields);
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Arc::new(LoggerSink::default()))
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
