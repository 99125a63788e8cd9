//! Engine configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default.
//!
//! ```json
//! { "speed": 4.0, "mode": "duel", "map": "perlin:24x24:seed=7" }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{MapManager, TurnTimer};
use crate::mapgen::GeneratorConfig;

/// Process-wide engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Buffer size of each game's inbox subscription.
    pub inbox_capacity: usize,
    /// Buffer size of each broadcast subscription.
    pub broadcast_capacity: usize,
    /// Turn timer speed multiplier.
    pub speed: f64,
    /// Default game mode name.
    pub mode: String,
    /// Default map identifier.
    pub map: String,
    /// Generation parameters an identifier leaves out.
    pub generator: GeneratorConfig,
    /// Seeded maps the map manager keeps; 0 disables caching.
    pub map_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: 1024,
            broadcast_capacity: 256,
            speed: 1.0,
            mode: "classic".to_string(),
            map: "perlin:20x20".to_string(),
            generator: GeneratorConfig::default(),
            map_cache_capacity: MapManager::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or holds
    /// unusable values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero capacities, a speed outside
    /// the timer's supported range, or empty names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbox_capacity == 0 || self.broadcast_capacity == 0 {
            return Err(ConfigError::Invalid("capacities must be at least 1".into()));
        }
        if !(TurnTimer::MIN_SPEED..=TurnTimer::MAX_SPEED).contains(&self.speed) {
            return Err(ConfigError::Invalid(format!(
                "speed must be in [{}, {}], got {}",
                TurnTimer::MIN_SPEED,
                TurnTimer::MAX_SPEED,
                self.speed
            )));
        }
        if self.mode.is_empty() || self.map.is_empty() {
            return Err(ConfigError::Invalid("mode and map must be set".into()));
        }
        Ok(())
    }
}
