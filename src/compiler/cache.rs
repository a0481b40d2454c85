//! Compiled query cache
//!
//! Keyed by `ModelKey`, which is derived from model content, so two
//! independently translated but identical queries share one entry.
//! Scoped to its owning provider; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::query::{ModelKey, QueryModel};

use super::compiler::{CompiledQuery, QueryCompiler};
use super::errors::{CompilerError, CompilerResult};

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub query: Arc<CompiledQuery>,
    /// True when no compilation was needed
    pub hit: bool,
}

pub struct CompiledQueryCache {
    compiler: QueryCompiler,
    entries: RwLock<HashMap<ModelKey, Arc<CompiledQuery>>>,
    compilations: AtomicU64,
    hits: AtomicU64,
}

impl CompiledQueryCache {
    pub fn new(compiler: QueryCompiler) -> Self {
        Self {
            compiler,
            entries: RwLock::new(HashMap::new()),
            compilations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Returns the cached compilation for a model, compiling it on first use
    pub fn get_or_compile(&self, model: &QueryModel) -> CompilerResult<CacheLookup> {
        let key = model.key();

        if let Some(query) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(CacheLookup { query, hit: true });
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        // Raced with another compilation of the same shape
        if let Some(query) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(CacheLookup {
                query: Arc::clone(query),
                hit: true,
            });
        }

        let compiled = Arc::new(self.compiler.compile(model)?);
        self.compilations.fetch_add(1, Ordering::Relaxed);
        entries.insert(key, Arc::clone(&compiled));

        Ok(CacheLookup {
            query: compiled,
            hit: false,
        })
    }

    pub fn get(&self, key: &ModelKey) -> Option<Arc<CompiledQuery>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Like `get`, but a missing entry is a misuse error
    pub fn require(&self, key: &ModelKey) -> CompilerResult<Arc<CompiledQuery>> {
        self.get(key)
            .ok_or_else(|| CompilerError::not_compiled(key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of compilations performed
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of lookups served without compiling
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Default for CompiledQueryCache {
    fn default() -> Self {
        Self::new(QueryCompiler::default())
    }
}
