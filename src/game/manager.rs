//! Map identifier resolution and caching.
//!
//! Identifiers take the form `<generator>:<W>x<H>[:key=value,...]`, for
//! example `perlin:30x20:mountains=0.25,seed=7`. Anything registered with
//! [`MapManager::insert_static`] resolves by exact name first.
//!
//! Seeded maps are cached by identifier and active player count. The cache
//! holds at most [`MapManager::DEFAULT_CACHE_CAPACITY`] maps unless
//! configured otherwise and evicts the oldest entry first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::MapSource;
use crate::error::MapError;
use crate::map::{Map, MapInfo, Size};
use crate::mapgen::{GeneratorConfig, GeneratorRegistry, PlayerSlot};

/// A parsed generated-map identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSpec {
    /// Generator name.
    pub generator: String,
    /// Grid size.
    pub size: Size,
    /// Generation parameters.
    pub config: GeneratorConfig,
    /// An explicit seed was given, so the result is reproducible.
    pub seeded: bool,
}

impl MapSpec {
    /// Parse `id`, filling unspecified parameters from `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidMapId`] for malformed identifiers.
    pub fn parse(id: &str, defaults: &GeneratorConfig) -> Result<Self, MapError> {
        let invalid = |reason: &str| MapError::InvalidMapId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = id.splitn(3, ':');
        let generator = parts
            .next()
            .filter(|g| !g.is_empty())
            .ok_or_else(|| invalid("missing generator name"))?;
        let dims = parts.next().ok_or_else(|| invalid("missing size"))?;
        let (w, h) = dims
            .split_once('x')
            .ok_or_else(|| invalid("size must be <W>x<H>"))?;
        let width = w.parse::<u16>().map_err(|_| invalid("bad width"))?;
        let height = h.parse::<u16>().map_err(|_| invalid("bad height"))?;

        let mut config = *defaults;
        let mut seeded = false;
        if let Some(params) = parts.next() {
            for pair in params.split(',').filter(|p| !p.is_empty()) {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| invalid("parameters must be key=value"))?;
                let bad = || invalid(&format!("bad value for `{key}`"));
                match key {
                    "mountains" => config.mountain_density = value.parse().map_err(|_| bad())?,
                    "castles" => config.castle_density = value.parse().map_err(|_| bad())?,
                    "distance" => config.min_castle_distance = value.parse().map_err(|_| bad())?,
                    "attempts" => config.max_attempts = value.parse().map_err(|_| bad())?,
                    "seed" => {
                        config.seed = value.parse().map_err(|_| bad())?;
                        seeded = true;
                    }
                    _ => return Err(invalid(&format!("unknown parameter `{key}`"))),
                }
            }
        }

        Ok(Self {
            generator: generator.to_string(),
            size: Size::new(width, height),
            config,
            seeded,
        })
    }
}

type CacheKey = (String, usize);

/// Insertion-ordered map cache with a fixed capacity.
#[derive(Debug)]
struct MapCache {
    capacity: usize,
    order: VecDeque<CacheKey>,
    maps: HashMap<CacheKey, Map>,
}

impl MapCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            maps: HashMap::new(),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<&Map> {
        self.maps.get(key)
    }

    fn insert(&mut self, key: CacheKey, map: Map) {
        if self.capacity == 0 {
            return;
        }
        if self.maps.insert(key.clone(), map).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!(map = %oldest.0, players = oldest.1, "map.cache.evicted");
                self.maps.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.maps.clear();
    }
}

/// [`MapSource`] backed by the generator registry and a set of static maps.
#[derive(Debug)]
pub struct MapManager {
    generators: GeneratorRegistry,
    statics: HashMap<String, Map>,
    defaults: GeneratorConfig,
    cache: Mutex<MapCache>,
}

impl MapManager {
    /// Seeded maps kept by default.
    pub const DEFAULT_CACHE_CAPACITY: usize = 64;

    /// Manager over `generators` with default generation parameters.
    #[must_use]
    pub fn new(generators: GeneratorRegistry) -> Self {
        Self {
            generators,
            statics: HashMap::new(),
            defaults: GeneratorConfig::default(),
            cache: Mutex::new(MapCache::new(Self::DEFAULT_CACHE_CAPACITY)),
        }
    }

    /// Keep at most `capacity` generated maps; 0 disables the cache.
    #[must_use]
    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        Self {
            cache: Mutex::new(MapCache::new(capacity)),
            ..self
        }
    }

    /// Use `defaults` for parameters an identifier leaves out.
    #[must_use]
    pub fn with_defaults(mut self, defaults: GeneratorConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Register a fixed map under `name`.
    pub fn insert_static(&mut self, name: impl Into<String>, map: Map) {
        self.statics.insert(name.into(), map);
    }

    /// Number of cached generated maps.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).maps.len()
    }

    /// Drop every cached generated map.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn generate(&self, map_id: &str, spec: &MapSpec, players: &[PlayerSlot]) -> Result<Map, MapError> {
        let generator = self.generators.get(&spec.generator)?;
        let mut map = generator.generate(spec.size, players, &spec.config)?;
        let info = map.info().clone();
        map.set_info(MapInfo {
            id: map_id.to_string(),
            ..info
        });
        Ok(map)
    }
}

impl MapSource for MapManager {
    fn resolve(&self, map_id: &str, players: &[PlayerSlot]) -> Result<Map, MapError> {
        if let Some(map) = self.statics.get(map_id) {
            return Ok(map.clone());
        }

        let mut spec = MapSpec::parse(map_id, &self.defaults)?;
        if !spec.seeded {
            spec.config.seed = rand::random();
            debug!(map = map_id, seed = spec.config.seed, "map.resolve.unseeded");
            return self.generate(map_id, &spec, players);
        }

        let key = (map_id.to_string(), players.iter().filter(|s| s.active).count());
        if let Some(map) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            debug!(map = map_id, "map.resolve.cached");
            return Ok(map.clone());
        }

        let map = self.generate(map_id, &spec, players)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, map.clone());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockRegistry};
    use crate::error::GenerateError;

    fn manager() -> MapManager {
        MapManager::new(GeneratorRegistry::with_defaults(&BlockRegistry::with_defaults()).unwrap())
    }

    #[test]
    fn test_parse_full_id() {
        let spec = MapSpec::parse(
            "perlin:30x20:mountains=0.3,castles=0.05,distance=4,seed=9,attempts=5",
            &GeneratorConfig::default(),
        )
        .unwrap();
        assert_eq!(spec.generator, "perlin");
        assert_eq!(spec.size, Size::new(30, 20));
        assert!((spec.config.mountain_density - 0.3).abs() < f64::EPSILON);
        assert!((spec.config.castle_density - 0.05).abs() < f64::EPSILON);
        assert_eq!(spec.config.min_castle_distance, 4);
        assert_eq!(spec.config.seed, 9);
        assert_eq!(spec.config.max_attempts, 5);
        assert!(spec.seeded);
    }

    #[test]
    fn test_parse_defaults() {
        let spec = MapSpec::parse("perlin:16x16", &GeneratorConfig::default()).unwrap();
        assert_eq!(spec.config, GeneratorConfig::default());
        assert!(!spec.seeded);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for id in [
            "",
            "perlin",
            "perlin:16",
            "perlin:axb",
            "perlin:16x16:seed",
            "perlin:16x16:seed=abc",
            "perlin:16x16:lakes=3",
        ] {
            assert!(
                matches!(
                    MapSpec::parse(id, &GeneratorConfig::default()),
                    Err(MapError::InvalidMapId { .. })
                ),
                "{id:?}"
            );
        }
    }

    #[test]
    fn test_seeded_maps_are_cached_per_player_count() {
        let maps = manager();
        let a = maps.resolve("perlin:20x20:seed=3", &PlayerSlot::active_seats(2)).unwrap();
        let b = maps.resolve("perlin:20x20:seed=3", &PlayerSlot::active_seats(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.info().id, "perlin:20x20:seed=3");
        assert_eq!(maps.cached(), 1);

        maps.resolve("perlin:20x20:seed=3", &PlayerSlot::active_seats(3)).unwrap();
        assert_eq!(maps.cached(), 2);
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let map = |name: &str| {
            Map::from_rows(MapInfo::new(name, name, ""), vec![vec![Block::Blank]]).unwrap()
        };
        let key = |name: &str| (name.to_string(), 2);
        let mut cache = MapCache::new(2);
        cache.insert(key("a"), map("a"));
        cache.insert(key("b"), map("b"));
        cache.insert(key("a"), map("a"));
        assert_eq!(cache.maps.len(), 2);

        cache.insert(key("c"), map("c"));
        assert_eq!(cache.maps.len(), 2);
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("c")).is_some());

        let mut disabled = MapCache::new(0);
        disabled.insert(key("a"), map("a"));
        assert!(disabled.maps.is_empty());
    }

    #[test]
    fn test_cache_capacity_and_clear() {
        let maps = manager().with_cache_capacity(0);
        maps.resolve("perlin:20x20:seed=3", &PlayerSlot::active_seats(2)).unwrap();
        assert_eq!(maps.cached(), 0);

        let maps = manager();
        maps.resolve("perlin:20x20:seed=3", &PlayerSlot::active_seats(2)).unwrap();
        assert_eq!(maps.cached(), 1);
        maps.clear_cache();
        assert_eq!(maps.cached(), 0);
    }

    #[test]
    fn test_unseeded_maps_are_not_cached() {
        let maps = manager();
        maps.resolve("perlin:20x20", &PlayerSlot::active_seats(2)).unwrap();
        assert_eq!(maps.cached(), 0);
    }

    #[test]
    fn test_static_map_wins() {
        let mut maps = manager();
        let arena = Map::from_rows(
            MapInfo::new("arena", "Arena", ""),
            vec![vec![Block::king(1, 1), Block::Blank, Block::king(1, 2)]],
        )
        .unwrap();
        maps.insert_static("arena", arena.clone());
        assert_eq!(maps.resolve("arena", &PlayerSlot::active_seats(2)).unwrap(), arena);
    }

    #[test]
    fn test_errors_propagate() {
        let maps = manager();
        assert_eq!(
            maps.resolve("caves:20x20", &PlayerSlot::active_seats(2)),
            Err(MapError::UnknownGenerator("caves".into()))
        );
        assert!(matches!(
            maps.resolve("perlin:4x4:seed=1", &PlayerSlot::active_seats(2)),
            Err(MapError::Generate(GenerateError::TooSmall { .. }))
        ));
    }
}
