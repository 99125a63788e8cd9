//! Named lookup of map generators.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{MapGenerator, PerlinGenerator};
use crate::block::BlockRegistry;
use crate::error::MapError;

/// Generators keyed by name.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<String, Arc<dyn MapGenerator>>,
}

impl GeneratorRegistry {
    /// Registry holding the built-in generators.
    ///
    /// # Errors
    ///
    /// Fails when `blocks` lacks a kind a built-in generator places.
    pub fn with_defaults(blocks: &BlockRegistry) -> Result<Self, MapError> {
        let mut registry = Self::default();
        registry.register(Arc::new(PerlinGenerator::new(blocks)?));
        Ok(registry)
    }

    /// Add or replace a generator under its own name.
    pub fn register(&mut self, generator: Arc<dyn MapGenerator>) {
        self.generators.insert(generator.name().to_string(), generator);
    }

    /// Look up a generator by name.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnknownGenerator`] if nothing is registered as `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn MapGenerator>, MapError> {
        self.generators
            .get(name)
            .cloned()
            .ok_or_else(|| MapError::UnknownGenerator(name.to_string()))
    }

    /// Registered generator names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_perlin() {
        let registry = GeneratorRegistry::with_defaults(&BlockRegistry::with_defaults()).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["perlin"]);
        assert_eq!(registry.get("perlin").unwrap().name(), "perlin");
    }

    #[test]
    fn test_unknown_generator() {
        let registry = GeneratorRegistry::default();
        assert_eq!(
            registry.get("caves").unwrap_err(),
            MapError::UnknownGenerator("caves".into())
        );
    }

    #[test]
    fn test_missing_block_kind_fails() {
        assert!(matches!(
            GeneratorRegistry::with_defaults(&BlockRegistry::empty()),
            Err(MapError::UnknownBlock(_))
        ));
    }
}
