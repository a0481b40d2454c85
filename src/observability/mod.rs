//! Observability subsystem
//!
//! - Structured JSON-line logging
//! - Typed diagnostic events delivered to a pluggable sink
//! - Monotonic metrics counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. It never affects control flow
//! 3. Output is deterministic

mod diagnostics;
mod events;
mod logger;
mod metrics;

pub use diagnostics::{
    DiagnosticRecord, Diagnostics, DiagnosticsSink, LoggerSink, MemorySink, NullSink,
};
pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
