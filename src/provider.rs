//! Query provider
//!
//! Owns everything one logical store connection needs: the mapping cache,
//! the compiled query cache, the store client, the execution strategy and
//! the diagnostics sink. Nothing here is process-global; two providers
//! never share a cache.
//!
//! Flow per query:
//! 1. Translate (rejects unsupported shapes; no store request is made)
//! 2. Compile, or reuse the cached compilation for the same model
//! 3. Hand a fresh cursor to the caller

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::codec::TypeRegistry;
use crate::compiler::{CompiledQuery, CompiledQueryCache, ExplainPlan, QueryCompiler};
use crate::config::ProviderConfig;
use crate::entity::{Entity, FromRow, Row};
use crate::error::QueryResult;
use crate::executor::{
    entity_stream, CursorSettings, EntityStream, ExecutionStrategy, ExecutorError, QueryCursor,
    ResumeToken, RetryWithBackoff, StoreClient,
};
use crate::mapping::{EntityMapping, MappingCache, MappingError, MappingProvider, StaticMappings};
use crate::observability::{Diagnostics, Event, MetricsSnapshot};
use crate::query::{QueryExpression, QueryOptions, QueryTranslator};

/// Builder for `QueryProvider`
pub struct QueryProviderBuilder {
    store: Arc<dyn StoreClient>,
    mappings: Vec<EntityMapping>,
    mapping_provider: Option<Arc<dyn MappingProvider>>,
    strategy: Arc<dyn ExecutionStrategy>,
    diagnostics: Diagnostics,
    registry: TypeRegistry,
    defaults: CursorSettings,
}

impl QueryProviderBuilder {
    /// Declares a mapping
    pub fn mapping(mut self, mapping: EntityMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Declares the mapping of a typed entity
    pub fn entity<T: Entity>(self) -> Self {
        self.mapping(T::mapping())
    }

    /// Resolves mappings through an external provider instead of declared ones
    pub fn mapping_provider(mut self, provider: Arc<dyn MappingProvider>) -> Self {
        self.mapping_provider = Some(provider);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Page size used when a query sets none
    pub fn default_page_size(mut self, page_size: Option<u32>) -> Self {
        self.defaults.page_size = page_size;
        self
    }

    /// Whether queries follow continuation tokens unless they say otherwise
    pub fn auto_paginate(mut self, auto_paginate: bool) -> Self {
        self.defaults.auto_paginate = auto_paginate;
        self
    }

    /// Validates declared mappings and builds the provider.
    ///
    /// Declared mappings and an external provider are mutually exclusive.
    pub fn build(self) -> QueryResult<QueryProvider> {
        let provider: Arc<dyn MappingProvider> = match self.mapping_provider {
            Some(provider) => {
                if let Some(mapping) = self.mappings.first() {
                    return Err(MappingError::invalid(
                        &mapping.entity,
                        "declared mappings cannot be combined with an external mapping provider",
                    )
                    .into());
                }
                provider
            }
            None => Arc::new(StaticMappings::from_mappings(self.mappings)?),
        };

        Ok(QueryProvider {
            mappings: MappingCache::new(provider),
            cache: CompiledQueryCache::new(QueryCompiler::new(self.registry)),
            store: self.store,
            strategy: self.strategy,
            diagnostics: self.diagnostics,
            defaults: self.defaults,
        })
    }
}

/// Entry point for compiling and running queries against one store
pub struct QueryProvider {
    mappings: MappingCache,
    cache: CompiledQueryCache,
    store: Arc<dyn StoreClient>,
    strategy: Arc<dyn ExecutionStrategy>,
    diagnostics: Diagnostics,
    defaults: CursorSettings,
}

/// Compiled query plus the settings its enumeration runs with
struct Prepared {
    query: Arc<CompiledQuery>,
    settings: CursorSettings,
}

impl QueryProvider {
    pub fn builder(store: Arc<dyn StoreClient>) -> QueryProviderBuilder {
        QueryProviderBuilder {
            store,
            mappings: Vec::new(),
            mapping_provider: None,
            strategy: Arc::new(RetryWithBackoff::default()),
            diagnostics: Diagnostics::default(),
            registry: TypeRegistry::new(),
            defaults: CursorSettings::default(),
        }
    }

    /// Builds a provider from a loaded configuration
    pub fn from_config(config: &ProviderConfig, store: Arc<dyn StoreClient>) -> QueryResult<Self> {
        Self::from_config_with_diagnostics(config, store, Diagnostics::default())
    }

    /// Same as `from_config`, logging through the given diagnostics.
    ///
    /// `log_diagnostics: false` in the config still silences everything.
    pub fn from_config_with_diagnostics(
        config: &ProviderConfig,
        store: Arc<dyn StoreClient>,
        diagnostics: Diagnostics,
    ) -> QueryResult<Self> {
        config.validate()?;

        let diagnostics = if config.log_diagnostics {
            diagnostics
        } else {
            Diagnostics::disabled()
        };

        let mapping_count = config.mappings.len().to_string();
        diagnostics.emit(Event::ConfigLoaded, &[("mappings", mapping_count.as_str())]);

        config
            .mappings
            .iter()
            .cloned()
            .fold(Self::builder(store), QueryProviderBuilder::mapping)
            .strategy(Arc::new(config.retry.strategy()))
            .diagnostics(diagnostics)
            .default_page_size(config.default_page_size)
            .auto_paginate(config.auto_paginate)
            .build()
    }

    /// Translates and compiles an expression.
    ///
    /// Identical query shapes share one compilation.
    pub fn compile(&self, expr: &QueryExpression) -> QueryResult<Arc<CompiledQuery>> {
        self.prepare(expr).map(|prepared| prepared.query)
    }

    /// Describes what an expression compiles to, or why it is rejected
    pub fn explain(&self, expr: &QueryExpression) -> ExplainPlan {
        match self.prepare(expr) {
            Ok(prepared) => ExplainPlan::from_compiled(
                &prepared.query,
                prepared.settings.page_size,
                prepared.settings.auto_paginate,
            ),
            Err(err) => ExplainPlan::rejected(err.code(), &err.to_string()),
        }
    }

    /// Fresh cursor over an expression. Nothing is fetched until it is advanced.
    pub fn cursor(&self, expr: &QueryExpression) -> QueryResult<QueryCursor> {
        let prepared = self.prepare(expr)?;
        Ok(self.open(prepared))
    }

    /// Cursor that stops with a cancelled error once `cancellation` fires
    pub fn cursor_with_cancellation(
        &self,
        expr: &QueryExpression,
        cancellation: CancellationToken,
    ) -> QueryResult<QueryCursor> {
        Ok(self.cursor(expr)?.with_cancellation(cancellation))
    }

    /// Cursor that continues from a token issued by an earlier enumeration
    /// of the same query
    pub fn resume(&self, expr: &QueryExpression, token: &ResumeToken) -> QueryResult<QueryCursor> {
        Ok(self.cursor(expr)?.resume_from(token)?)
    }

    /// Lazy stream of typed entities
    pub fn execute<T>(&self, expr: &QueryExpression) -> QueryResult<EntityStream<T>>
    where
        T: FromRow + Send + 'static,
    {
        Ok(entity_stream(self.cursor(expr)?))
    }

    /// Lazy stream of untyped rows
    pub fn execute_rows(&self, expr: &QueryExpression) -> QueryResult<EntityStream<Row>> {
        self.execute::<Row>(expr)
    }

    pub fn execute_with_cancellation<T>(
        &self,
        expr: &QueryExpression,
        cancellation: CancellationToken,
    ) -> QueryResult<EntityStream<T>>
    where
        T: FromRow + Send + 'static,
    {
        Ok(entity_stream(
            self.cursor_with_cancellation(expr, cancellation)?,
        ))
    }

    /// Runs a query to completion
    pub async fn collect<T: FromRow>(&self, expr: &QueryExpression) -> QueryResult<Vec<T>> {
        Ok(self.cursor(expr)?.collect_all::<T>().await?)
    }

    /// Blocking enumeration is not offered; always fails without contacting the store
    pub fn execute_blocking<T: FromRow>(&self, _expr: &QueryExpression) -> QueryResult<Vec<T>> {
        Err(ExecutorError::sync_unsupported().into())
    }

    /// Previously compiled query for an expression; misuse if it was never compiled
    pub fn compiled(&self, expr: &QueryExpression) -> QueryResult<Arc<CompiledQuery>> {
        let translated = QueryTranslator::new(&self.mappings).translate(expr)?;
        Ok(self.cache.require(&translated.model.key())?)
    }

    pub fn cache(&self) -> &CompiledQueryCache {
        &self.cache
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.diagnostics.metrics().snapshot()
    }

    fn prepare(&self, expr: &QueryExpression) -> QueryResult<Prepared> {
        let translated = match QueryTranslator::new(&self.mappings).translate(expr) {
            Ok(translated) => translated,
            Err(err) => {
                self.diagnostics.metrics().increment_queries_rejected();
                self.diagnostics.emit(
                    Event::QueryRejected,
                    &[
                        ("code", err.code().code()),
                        ("construct", err.construct().unwrap_or("-")),
                        ("reason", err.message()),
                    ],
                );
                return Err(err.into());
            }
        };

        self.diagnostics.metrics().increment_queries_translated();
        let property_count = translated.model.properties().len().to_string();
        self.diagnostics.emit(
            Event::QueryTranslated,
            &[
                ("entity", translated.model.entity()),
                ("properties", property_count.as_str()),
                ("table", translated.model.table()),
            ],
        );

        let lookup = self.cache.get_or_compile(&translated.model)?;
        if lookup.hit {
            self.diagnostics.metrics().increment_cache_hits();
            self.diagnostics.emit(
                Event::CompiledQueryCacheHit,
                &[("fingerprint", lookup.query.fingerprint())],
            );
        } else {
            self.diagnostics.metrics().increment_compilations();
            self.diagnostics.emit(
                Event::QueryCompiled,
                &[
                    ("fingerprint", lookup.query.fingerprint()),
                    ("statement", lookup.query.statement()),
                ],
            );
        }

        Ok(Prepared {
            query: lookup.query,
            settings: self.settings_for(translated.options),
        })
    }

    fn settings_for(&self, options: QueryOptions) -> CursorSettings {
        CursorSettings {
            page_size: options.page_size.or(self.defaults.page_size),
            auto_paginate: options.auto_paginate.unwrap_or(self.defaults.auto_paginate),
        }
    }

    fn open(&self, prepared: Prepared) -> QueryCursor {
        QueryCursor::new(
            prepared.query,
            Arc::clone(&self.store),
            Arc::clone(&self.strategy),
            self.diagnostics.clone(),
            prepared.settings,
        )
    }
}
