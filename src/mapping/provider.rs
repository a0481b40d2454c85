//! Mapping metadata providers
//!
//! The provider is an external collaborator: it is asked once per distinct
//! entity shape, and the answer is treated as immutable for the lifetime of
//! the owning `MappingCache`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::errors::{MappingError, MappingResult};
use super::types::EntityMapping;

/// Source of entity mapping metadata (read-only)
pub trait MappingProvider: Send + Sync {
    /// Resolves the mapping for an entity shape
    fn resolve(&self, entity: &str) -> MappingResult<EntityMapping>;
}

/// Mappings declared up front (config file or code)
#[derive(Debug, Clone, Default)]
pub struct StaticMappings {
    mappings: HashMap<String, EntityMapping>,
}

impl StaticMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from a list of mappings, validating each one
    pub fn from_mappings(mappings: impl IntoIterator<Item = EntityMapping>) -> MappingResult<Self> {
        let mut registry = Self::new();
        for mapping in mappings {
            registry.register(mapping)?;
        }
        Ok(registry)
    }

    /// Registers a mapping. Re-registering an entity is rejected.
    pub fn register(&mut self, mapping: EntityMapping) -> MappingResult<()> {
        mapping.validate_structure()?;

        if self.mappings.contains_key(&mapping.entity) {
            return Err(MappingError::invalid(
                &mapping.entity,
                "entity is already mapped",
            ));
        }

        self.mappings.insert(mapping.entity.clone(), mapping);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl MappingProvider for StaticMappings {
    fn resolve(&self, entity: &str) -> MappingResult<EntityMapping> {
        self.mappings
            .get(entity)
            .cloned()
            .ok_or_else(|| MappingError::unknown_entity(entity))
    }
}

/// Memoizing front for a mapping provider.
///
/// Each entity shape is resolved through the provider at most once;
/// failures are not cached.
pub struct MappingCache {
    provider: Arc<dyn MappingProvider>,
    resolved: RwLock<HashMap<String, Arc<EntityMapping>>>,
    provider_lookups: AtomicU64,
}

impl MappingCache {
    pub fn new(provider: Arc<dyn MappingProvider>) -> Self {
        Self {
            provider,
            resolved: RwLock::new(HashMap::new()),
            provider_lookups: AtomicU64::new(0),
        }
    }

    /// Returns the mapping for an entity, consulting the provider on first use
    pub fn mapping_for(&self, entity: &str) -> MappingResult<Arc<EntityMapping>> {
        if let Ok(resolved) = self.resolved.read() {
            if let Some(mapping) = resolved.get(entity) {
                return Ok(Arc::clone(mapping));
            }
        }

        let mut resolved = self
            .resolved
            .write()
            .map_err(|_| MappingError::invalid(entity, "mapping cache lock poisoned"))?;

        // Another caller may have resolved it while we waited for the lock
        if let Some(mapping) = resolved.get(entity) {
            return Ok(Arc::clone(mapping));
        }

        self.provider_lookups.fetch_add(1, Ordering::Relaxed);
        let mapping = self.provider.resolve(entity)?;
        mapping.validate_structure()?;

        let mapping = Arc::new(mapping);
        resolved.insert(entity.to_string(), Arc::clone(&mapping));
        Ok(mapping)
    }

    /// Number of times the underlying provider was consulted
    pub fn provider_lookups(&self) -> u64 {
        self.provider_lookups.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarKind;
    use crate::mapping::{MappingErrorCode, PropertyMapping};

    fn registry() -> StaticMappings {
        StaticMappings::from_mappings([
            EntityMapping::new("User", "users")
                .with_property(PropertyMapping::new("Id", ScalarKind::String)),
            EntityMapping::new("Order", "orders")
                .with_property(PropertyMapping::new("Total", ScalarKind::Decimal)),
        ])
        .unwrap()
    }

    #[test]
    fn test_static_resolve() {
        let mappings = registry();
        assert_eq!(mappings.resolve("User").unwrap().table, "users");
        assert_eq!(
            mappings.resolve("Ghost").unwrap_err().code(),
            MappingErrorCode::AeroMappingUnknownEntity
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut mappings = registry();
        let result = mappings.register(
            EntityMapping::new("User", "users2")
                .with_property(PropertyMapping::new("Id", ScalarKind::String)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_consults_provider_once_per_shape() {
        let cache = MappingCache::new(Arc::new(registry()));

        for _ in 0..5 {
            cache.mapping_for("User").unwrap();
        }
        cache.mapping_for("Order").unwrap();
        cache.mapping_for("Order").unwrap();

        assert_eq!(cache.provider_lookups(), 2);
    }

    #[test]
    fn test_cache_does_not_remember_failures() {
        let cache = MappingCache::new(Arc::new(registry()));
        assert!(cache.mapping_for("Ghost").is_err());
        assert!(cache.mapping_for("Ghost").is_err());
        assert_eq!(cache.provider_lookups(), 2);
    }
}
