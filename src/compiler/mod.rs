//! Query compiler
//!
//! Lowers a `QueryModel` into statement text plus an executable
//! materializer, and caches the result per model shape.
//!
//! # Pipeline
//!
//! 1. Injection: bind the raw record parameter
//! 2. Materialization: entity construction over abstract property accesses
//! 3. Binding removal: property accesses become attribute lookups
//!
//! Statement text is a pure function of the model.

mod cache;
mod compiler;
mod errors;
mod explain;
mod materializer;
mod plan;
mod statement;

pub use cache::{CacheLookup, CompiledQueryCache};
pub use compiler::{CompiledQuery, QueryCompiler};
pub use errors::{CompilerError, CompilerErrorCode, CompilerResult, Severity};
pub use explain::ExplainPlan;
pub use materializer::Materializer;
pub use plan::{
    inject, materialize, remove_bindings, BoundPlan, InjectedPlan, MaterializationPlan, PlanExpr,
    RECORD_PARAMETER,
};
pub use statement::{quote_identifier, statement_fingerprint, statement_text};
